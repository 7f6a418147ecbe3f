//! Deterministic noise for unvoiced excitation.
//!
//! The generator is the classic ANSI C linear congruential one, so runs are
//! reproducible bit for bit from a seed.

use crate::math::{ln, sqrt};
use rand::RngCore;

const LCG_MULTIPLIER: u64 = 1_103_515_245;
const LCG_INCREMENT: u64 = 12_345;

/// Linear congruential generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    next: u64,
}

impl Lcg {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Lcg { next: seed }
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Lcg::new(1)
    }
}

impl RngCore for Lcg {
    fn next_u32(&mut self) -> u32 {
        self.next = self
            .next
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.next as u32
    }

    fn next_u64(&mut self) -> u64 {
        rand::rand_core::impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        rand::rand_core::impls::fill_bytes_via_next(self, dst);
    }
}

/// Uniform value in `[0, 1]` from the top 15 bits of the state.
pub fn uniform<R: RngCore>(rng: &mut R) -> f64 {
    f64::from((rng.next_u32() >> 16) & 0x7fff) / 32767.0
}

/// Noise excitation built on a generator.
#[derive(Debug, Clone)]
pub struct NoiseSource<R = Lcg> {
    rng: R,
    cached: Option<f64>,
}

impl NoiseSource<Lcg> {
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::new(Lcg::new(seed))
    }
}

impl<R: RngCore> NoiseSource<R> {
    pub fn new(rng: R) -> Self {
        NoiseSource { rng, cached: None }
    }

    /// Unit-variance Gaussian sample.
    ///
    /// Polar Box-Muller: each accepted pair yields two samples, the second of
    /// which is returned on the following call.
    pub fn gaussian(&mut self) -> f64 {
        if let Some(v) = self.cached.take() {
            return v;
        }
        loop {
            let r1 = 2.0 * uniform(&mut self.rng) - 1.0;
            let r2 = 2.0 * uniform(&mut self.rng) - 1.0;
            let s = r1 * r1 + r2 * r2;
            if s > 1.0 || s == 0.0 {
                continue;
            }
            let s = sqrt(-2.0 * ln(s) / s);
            self.cached = Some(r2 * s);
            return r1 * s;
        }
    }

    /// `+1.0` or `-1.0` with equal probability.
    pub fn plus_or_minus_one(&mut self) -> f64 {
        if uniform(&mut self.rng) > 0.5 {
            1.0
        } else {
            -1.0
        }
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}
