//! Excitation signals fed to the MLSA filter.
//!
//! Voiced frames are driven by a pulse train, unvoiced frames by noise. With
//! mixed excitation both run at once and are shaped by per-band FIR filters
//! whose taps are blended by the band strengths of each frame.

use crate::math::sqrt;
use crate::noise::{Lcg, NoiseSource};
use crate::traits::BasicFilter;
use alloc::{vec, vec::Vec};
use rand::RngCore;

/// Pitch pulse generator.
///
/// `period` is the current pitch period in samples (`0` when unvoiced) and
/// `phase` counts samples since the last pulse.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PulseTrain {
    pub period: f64,
    pub phase: f64,
}

impl PulseTrain {
    #[must_use]
    pub fn is_voiced(&self) -> bool {
        self.period != 0.0
    }

    /// Advances one sample; returns a pulse of `sqrt(period)` when the phase
    /// reaches the period, otherwise zero.
    pub fn next_sample(&mut self) -> f64 {
        self.phase += 1.0;
        if self.phase >= self.period {
            self.phase -= self.period;
            sqrt(self.period)
        } else {
            0.0
        }
    }
}

/// FIR filter whose taps can be replaced without clearing its history.
///
/// Every tap after the first sees one extra sample of delay:
/// ```text
///    y[n] = h[0] * x[n] + sum_{k>=1} h[k] * x[n - 1 - k]
/// ```
#[derive(Debug, Clone)]
pub struct ShapingFilter {
    taps: Vec<f64>,
    history: Vec<f64>,
}

impl ShapingFilter {
    #[must_use]
    pub fn new(order: usize) -> Self {
        ShapingFilter {
            taps: vec![0.0; order],
            history: vec![0.0; order],
        }
    }

    pub fn taps_mut(&mut self) -> &mut [f64] {
        &mut self.taps
    }

    #[must_use]
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }
}

impl BasicFilter for ShapingFilter {
    fn step(&mut self, x: f64) -> f64 {
        let Some(&first) = self.taps.first() else {
            return 0.0;
        };
        let mut y = 0.0;
        for k in (1..self.taps.len()).rev() {
            y += self.taps[k] * self.history[k];
            self.history[k] = self.history[k - 1];
        }
        y += first * x;
        self.history[0] = x;
        y
    }
}

/// Pulse and noise shaping for mixed excitation.
#[derive(Debug, Clone)]
pub struct MixedExcitation<'a> {
    /// band filters, `me_num` rows of `me_order` taps
    bands: &'a [Vec<f64>],
    pulse: ShapingFilter,
    noise: ShapingFilter,
}

impl<'a> MixedExcitation<'a> {
    #[must_use]
    pub fn new(bands: &'a [Vec<f64>], order: usize) -> Self {
        MixedExcitation {
            bands,
            pulse: ShapingFilter::new(order),
            noise: ShapingFilter::new(order),
        }
    }

    /// Blends the band filters for one frame.
    ///
    /// ```text
    ///    hpulse[i] = sum_j  str[j]      * h[j][i]
    ///    hnoise[i] = sum_j (1 - str[j]) * h[j][i]
    /// ```
    pub fn set_strengths(&mut self, strengths: &[f32]) {
        let hpulse = self.pulse.taps_mut();
        let hnoise = self.noise.taps_mut();
        for (i, (hp, hn)) in hpulse.iter_mut().zip(hnoise.iter_mut()).enumerate() {
            *hp = 0.0;
            *hn = 0.0;
            for (band, &s) in self.bands.iter().zip(strengths) {
                let h = band.get(i).copied().unwrap_or(0.0);
                *hp += f64::from(s) * h;
                *hn += f64::from(1.0 - s) * h;
            }
        }
    }

    /// Shapes one pulse sample and one noise sample and sums them.
    pub fn mix(&mut self, pulse: f64, noise: f64) -> f64 {
        self.pulse.step(pulse) + self.noise.step(noise)
    }
}

/// Source of the raw excitation samples.
#[derive(Debug, Clone)]
pub struct Excitation<R = Lcg> {
    noise: NoiseSource<R>,
    gaussian: bool,
}

impl<R: RngCore> Excitation<R> {
    pub fn new(rng: R, gaussian: bool) -> Self {
        Excitation {
            noise: NoiseSource::new(rng),
            gaussian,
        }
    }

    #[must_use]
    pub fn is_gaussian(&self) -> bool {
        self.gaussian
    }

    pub fn set_gaussian(&mut self, gaussian: bool) {
        self.gaussian = gaussian;
    }

    /// One sample of unvoiced excitation.
    pub fn unvoiced(&mut self) -> f64 {
        if self.gaussian {
            self.noise.gaussian()
        } else {
            self.noise.plus_or_minus_one()
        }
    }

    /// Noise that accompanies the pulse train under mixed excitation.
    pub fn voiced_noise(&mut self) -> f64 {
        self.noise.plus_or_minus_one()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulses_every_period() {
        let mut train = PulseTrain {
            period: 4.0,
            phase: 3.0,
        };
        let out: Vec<f64> = (0..9).map(|_| train.next_sample()).collect();
        assert_eq!(out, [2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn later_taps_lag_one_extra_sample() {
        let mut fir = ShapingFilter::new(3);
        fir.taps_mut().copy_from_slice(&[1.0, 0.5, 0.25]);
        let out: Vec<f64> = [1.0, 0.0, 0.0, 0.0, 0.0]
            .iter()
            .map(|&x| fir.step(x))
            .collect();
        assert_eq!(out, [1.0, 0.0, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn empty_shaping_filter_is_silent() {
        assert_eq!(ShapingFilter::new(0).step(3.0), 0.0);
    }

    #[test]
    fn full_strength_passes_pulse_only() {
        let bands = [vec![1.0, 0.0], vec![0.0, 1.0]];
        let mut mixed = MixedExcitation::new(&bands, 2);
        mixed.set_strengths(&[1.0, 1.0]);
        assert_eq!(mixed.pulse.taps(), &[1.0, 1.0]);
        assert_eq!(mixed.noise.taps(), &[0.0, 0.0]);
        assert_eq!(mixed.mix(2.0, 1.0), 2.0);

        mixed.set_strengths(&[0.25, 0.0]);
        assert_eq!(mixed.pulse.taps(), &[0.25, 0.0]);
        assert_eq!(mixed.noise.taps(), &[0.75, 1.0]);
    }

    #[test]
    fn unvoiced_noise_kind_follows_the_flag() {
        let mut ex = Excitation::new(Lcg::new(1), false);
        for _ in 0..20 {
            assert_eq!(ex.unvoiced().abs(), 1.0);
        }
        let mut gauss = Excitation::new(Lcg::new(1), true);
        assert!((0..20).any(|_| gauss.unvoiced().abs() != 1.0));
    }
}
