//! 16-bit PCM sample buffers.

use crate::error::WaveError;
use alloc::{collections::TryReserveError, vec, vec::Vec};

/// Interleaved 16-bit PCM audio.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wave {
    samples: Vec<i16>,
    sample_rate: u32,
    num_channels: u16,
}

impl Wave {
    /// A mono wave of `num_samples` zero samples.
    #[must_use]
    pub fn new(sample_rate: u32, num_samples: usize) -> Self {
        Wave {
            samples: vec![0; num_samples],
            sample_rate,
            num_channels: 1,
        }
    }

    /// Like [`Wave::new`], but reports a buffer that cannot be allocated
    /// instead of aborting.
    pub fn try_new(sample_rate: u32, num_samples: usize) -> Result<Self, TryReserveError> {
        let mut samples = Vec::new();
        samples.try_reserve_exact(num_samples)?;
        samples.resize(num_samples, 0);
        Ok(Wave {
            samples,
            sample_rate,
            num_channels: 1,
        })
    }

    #[must_use]
    pub fn from_samples(sample_rate: u32, num_channels: u16, samples: Vec<i16>) -> Self {
        Wave {
            samples,
            sample_rate,
            num_channels: num_channels.max(1),
        }
    }

    /// Resizes to `num_samples` frames of `num_channels` each, zero filling
    /// any new space and keeping existing samples.
    pub fn resize(&mut self, num_samples: usize, num_channels: u16) {
        self.num_channels = num_channels.max(1);
        self.samples
            .resize(num_samples * usize::from(self.num_channels), 0);
    }

    /// Keeps only the first `len` samples.
    pub fn truncate(&mut self, len: usize) {
        self.samples.truncate(len);
    }

    #[must_use]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }

    #[must_use]
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// Number of sample frames (samples per channel).
    #[must_use]
    pub fn num_samples(&self) -> usize {
        self.samples.len() / usize::from(self.num_channels.max(1))
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Length in seconds; zero for a wave without a sample rate.
    #[must_use]
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples() as f32 / self.sample_rate as f32
    }

    /// Multiplies every sample by `factor / 65536`, saturating at the `i16`
    /// range.
    pub fn rescale(&mut self, factor: i32) {
        for s in &mut self.samples {
            let scaled = (i64::from(*s) * i64::from(factor)) / 65536;
            *s = scaled.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16;
        }
    }

    /// Appends `other` to this wave.
    ///
    /// # Errors
    ///
    /// Fails if the sample rates or channel counts differ.
    pub fn concat(&mut self, other: &Wave) -> Result<(), WaveError> {
        if self.sample_rate != other.sample_rate {
            return Err(WaveError::SampleRateMismatch(
                self.sample_rate,
                other.sample_rate,
            ));
        }
        if self.num_channels != other.num_channels {
            return Err(WaveError::ChannelMismatch(
                self.num_channels,
                other.num_channels,
            ));
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impossible_buffers_are_reported() {
        assert!(Wave::try_new(16000, usize::MAX).is_err());
        let wave = Wave::try_new(16000, 3).unwrap();
        assert_eq!(wave.samples(), &[0, 0, 0]);
        assert_eq!(wave, Wave::new(16000, 3));
    }

    #[test]
    fn rescale_is_sixteen_sixteen_fixed_point() {
        let mut wave = Wave::from_samples(16000, 1, vec![100, -100, 30000, -30000]);
        wave.rescale(65536 / 2);
        assert_eq!(wave.samples(), &[50, -50, 15000, -15000]);
        wave.rescale(65536 * 4);
        assert_eq!(wave.samples(), &[200, -200, 32767, -32768]);
    }

    #[test]
    fn concat_checks_the_format() {
        let mut a = Wave::from_samples(16000, 1, vec![1, 2]);
        let b = Wave::from_samples(16000, 1, vec![3]);
        a.concat(&b).unwrap();
        assert_eq!(a.samples(), &[1, 2, 3]);

        let c = Wave::from_samples(8000, 1, vec![4]);
        assert_eq!(a.concat(&c), Err(WaveError::SampleRateMismatch(16000, 8000)));
        let d = Wave::from_samples(16000, 2, vec![4, 5]);
        assert_eq!(a.concat(&d), Err(WaveError::ChannelMismatch(1, 2)));
        assert_eq!(a.num_samples(), 3);
    }

    #[test]
    fn resize_keeps_samples_and_duration_follows() {
        let mut wave = Wave::new(16000, 4);
        wave.samples_mut()[0] = 7;
        wave.resize(16000, 1);
        assert_eq!(wave.samples()[0], 7);
        assert_eq!(wave.num_samples(), 16000);
        assert!((wave.duration_secs() - 1.0).abs() < f32::EPSILON);
        wave.truncate(8000);
        assert!((wave.duration_secs() - 0.5).abs() < f32::EPSILON);
    }
}
