//! Frame-parametric input to the vocoder.

use crate::error::SynthesisError;
use alloc::vec::Vec;

/// Frame shift used when neither the track times nor the voice give one.
pub const DEFAULT_FRAME_SHIFT_MS: f64 = 5.0;

/// A sequence of parameter frames with a time stamp each.
///
/// For a vocoder parameter track, channel 0 is F0 in Hz (`0` for unvoiced) and
/// the remaining channels are mel-cepstral coefficients. A band strength
/// track has one channel per mixed excitation band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    num_channels: usize,
    times: Vec<f32>,
    frames: Vec<Vec<f32>>,
}

impl Track {
    #[must_use]
    pub fn new(num_channels: usize) -> Self {
        Track {
            num_channels,
            times: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Builds a track of evenly spaced frames, `shift` seconds apart.
    ///
    /// # Errors
    ///
    /// Fails if any frame is not `num_channels` wide.
    pub fn with_shift(
        num_channels: usize,
        shift: f32,
        frames: impl IntoIterator<Item = Vec<f32>>,
    ) -> Result<Self, SynthesisError> {
        let mut track = Track::new(num_channels);
        for (i, frame) in frames.into_iter().enumerate() {
            track.push(shift * i as f32, frame)?;
        }
        Ok(track)
    }

    /// Appends one frame at time `time` (seconds).
    ///
    /// # Errors
    ///
    /// Fails if the frame is not `num_channels` wide.
    pub fn push(&mut self, time: f32, frame: Vec<f32>) -> Result<(), SynthesisError> {
        if frame.len() != self.num_channels {
            return Err(SynthesisError::FrameWidth {
                frame: self.frames.len(),
                found: frame.len(),
                expected: self.num_channels,
            });
        }
        self.times.push(time);
        self.frames.push(frame);
        Ok(())
    }

    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[must_use]
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[must_use]
    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    /// Frame shift in milliseconds as given by the first two time stamps.
    ///
    /// `None` unless there are at least two frames with increasing times.
    #[must_use]
    pub fn frame_shift_ms(&self) -> Option<f64> {
        match self.times.as_slice() {
            [t0, t1, ..] if t1 > t0 => Some(1000.0 * f64::from(t1 - t0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn frames_must_have_the_track_width() {
        let mut track = Track::new(3);
        track.push(0.0, vec![100.0, 0.1, 0.2]).unwrap();
        let err = track.push(0.005, vec![100.0]).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::FrameWidth {
                frame: 1,
                found: 1,
                expected: 3
            }
        );
        assert_eq!(track.num_frames(), 1);
    }

    #[test]
    fn shift_comes_from_the_first_two_times() {
        let track = Track::with_shift(1, 0.005, [vec![0.0], vec![0.0], vec![0.0]]).unwrap();
        let shift = track.frame_shift_ms().unwrap();
        assert!((shift - 5.0).abs() < 1e-4);
        assert_eq!(track.frame(2), Some(&[0.0f32][..]));
    }

    #[test]
    fn no_shift_without_increasing_times() {
        let mut track = Track::new(1);
        assert_eq!(track.frame_shift_ms(), None);
        track.push(0.1, vec![0.0]).unwrap();
        assert_eq!(track.frame_shift_ms(), None);
        track.push(0.1, vec![0.0]).unwrap();
        assert_eq!(track.frame_shift_ms(), None);
    }
}
