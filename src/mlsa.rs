//! The mel log spectrum approximation (MLSA) filter.
//!
//! The filter is a cascade of two stages, each a 5th order Padé
//! approximation of `exp(F(z))`:
//! ```text
//!    stage 1:  F1(z) = b[1] * W(z)
//!    stage 2:  F2(z) = sum_{k=2..m} b[k] * W(z)^k
//!
//!    W(z) = (1 - a^2) z^-1 / (1 - a z^-1)       all-pass warping, a = alpha
//!
//!    exp(F) ~ (1 + sum_l  pade[l] F^l) / (1 + sum_l (-1)^l pade[l] F^l)
//! ```
//! `b[0]` is a pure gain and is applied to the excitation, not here.

use crate::traits::BasicFilter;
use alloc::{vec, vec::Vec};

/// Order of the Padé approximation.
pub const PADE_ORDER: usize = 5;

/// Padé approximant coefficients for order 5.
pub const PADE: [f64; PADE_ORDER + 1] = [
    1.0,
    0.499_939_1,
    0.110_709_8,
    0.013_699_84,
    0.000_956_485_3,
    0.000_030_417_21,
];

/// Runs the Padé accumulation over the delay outputs `pt[1..]`.
///
/// Odd terms feed back positively, even terms negatively. Returns the updated
/// input and the summed output contribution.
#[inline]
fn pade_sum(mut x: f64, pt: &[f64; PADE_ORDER + 1]) -> (f64, f64) {
    let mut out = 0.0;
    for i in (1..=PADE_ORDER).rev() {
        let v = pt[i] * PADE[i];
        if i & 1 == 1 {
            x += v;
        } else {
            x -= v;
        }
        out += v;
    }
    (x, out)
}

/// First stage: one warped delay per Padé term, all scaled by `b[1]`.
#[derive(Debug, Clone, Default)]
struct FirstStage {
    d: [f64; PADE_ORDER + 1],
    pt: [f64; PADE_ORDER + 1],
}

impl FirstStage {
    fn step(&mut self, mut x: f64, b1: f64, alpha: f64) -> f64 {
        let aa = 1.0 - alpha * alpha;
        let mut out = 0.0;
        for i in (1..=PADE_ORDER).rev() {
            self.d[i] = aa * self.pt[i - 1] + alpha * self.d[i];
            self.pt[i] = self.d[i] * b1;
            let v = self.pt[i] * PADE[i];
            if i & 1 == 1 {
                x += v;
            } else {
                x -= v;
            }
            out += v;
        }
        self.pt[0] = x;
        out + x
    }
}

/// Row of the leading ghost, a copy of the last ring row.
const LEADING_GHOST: usize = 0;
/// First row of the ring proper.
const FIRST_RING_ROW: usize = 1;

/// Second stage: a warped delay line of length `m + 2` per Padé term.
///
/// Instead of shifting every delay line by one each sample, the rows live in
/// a ring and `start` moves backwards through it. Each row holds one delay
/// position for all five Padé terms. Ghost rows before and after the ring
/// mirror its opposite ends so neighbours can be read without wrapping.
#[derive(Debug, Clone)]
struct SecondStage {
    rows: Vec<[f64; PADE_ORDER]>,
    pt: [f64; PADE_ORDER + 1],
    /// ring row holding delay position 0
    start: usize,
    /// last ring row, `m + 2`
    last: usize,
}

impl SecondStage {
    fn new(order: usize) -> Self {
        let last = order + 2;
        SecondStage {
            rows: vec![[0.0; PADE_ORDER]; order + 4],
            pt: [0.0; PADE_ORDER + 1],
            start: last,
            last,
        }
    }

    fn wrap_next(&self, row: usize) -> usize {
        if row == self.last { FIRST_RING_ROW } else { row + 1 }
    }

    fn step(&mut self, x: f64, b: &[f64], alpha: f64) -> f64 {
        let aa = 1.0 - alpha * alpha;
        let trailing_ghost = self.last + 1;

        // delay position 1 takes the fed-back stage outputs
        let second = self.wrap_next(self.start);
        for q in 0..PADE_ORDER {
            self.rows[second][q] = aa * self.pt[q] + alpha * self.rows[second][q];
        }

        // positions 2..=m, each updated from its (already updated) predecessor
        // and its (not yet updated) successor
        let mut acc = [0.0; PADE_ORDER];
        let mut row = second;
        for &coef in b.iter().skip(2) {
            row += 1;
            if row > self.last {
                self.rows[LEADING_GHOST] = self.rows[self.last];
                row = FIRST_RING_ROW;
            }
            let prev = self.rows[row - 1];
            let next = self.rows[row + 1];
            let cur = &mut self.rows[row];
            for q in 0..PADE_ORDER {
                cur[q] += alpha * (next[q] - prev[q]);
                acc[q] += cur[q] * coef;
            }
        }

        // position 0 drops out; the old position 1 value survives in its place
        self.rows[self.start] = self.rows[second];
        self.rows[LEADING_GHOST] = self.rows[self.last];
        self.rows[trailing_ghost] = self.rows[FIRST_RING_ROW];
        self.pt[1..].copy_from_slice(&acc);

        let (x, out) = pade_sum(x, &self.pt);
        self.pt[0] = x;

        self.start = if self.start == FIRST_RING_ROW {
            self.last
        } else {
            self.start - 1
        };
        out + x
    }
}

/// An MLSA synthesis filter of a fixed order.
///
/// ```text
///    H(z) = exp( sum_{k=1..m} b[k] * W(z)^k )
/// ```
/// Coefficients can be changed between samples without resetting the state;
/// that is how the vocoder interpolates from frame to frame.
#[derive(Debug, Clone)]
pub struct MlsaFilter {
    alpha: f64,
    b: Vec<f64>,
    first: FirstStage,
    second: SecondStage,
}

impl MlsaFilter {
    /// A filter of cepstral order `order` (`order + 1` coefficients), at
    /// rest, with all coefficients zero.
    ///
    /// Orders below one are raised to one.
    #[must_use]
    pub fn new(order: usize, alpha: f64) -> Self {
        let order = order.max(1);
        MlsaFilter {
            alpha,
            b: vec![0.0; order + 1],
            first: FirstStage::default(),
            second: SecondStage::new(order),
        }
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.b.len() - 1
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.b
    }

    pub fn coefficients_mut(&mut self) -> &mut [f64] {
        &mut self.b
    }

    /// Copies in new coefficients. Missing trailing terms are zeroed and
    /// extra ones ignored.
    pub fn set_coefficients(&mut self, b: &[f64]) {
        let n = b.len().min(self.b.len());
        self.b[..n].copy_from_slice(&b[..n]);
        self.b[n..].fill(0.0);
    }
}

impl BasicFilter for MlsaFilter {
    fn step(&mut self, x: f64) -> f64 {
        let y = self.first.step(x, self.b[1], self.alpha);
        self.second.step(y, &self.b, self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseSource;

    /// Straightforward second stage that shifts its delay lines every sample.
    struct ShiftingSecondStage {
        d: Vec<[f64; PADE_ORDER]>,
        pt: [f64; PADE_ORDER + 1],
    }

    impl ShiftingSecondStage {
        fn new(order: usize) -> Self {
            ShiftingSecondStage {
                d: vec![[0.0; PADE_ORDER]; order + 2],
                pt: [0.0; PADE_ORDER + 1],
            }
        }

        fn step(&mut self, x: f64, b: &[f64], alpha: f64) -> f64 {
            let aa = 1.0 - alpha * alpha;
            let m = b.len() - 1;
            let mut acc = [0.0; PADE_ORDER];
            let d = &mut self.d;
            for q in 0..PADE_ORDER {
                d[1][q] = aa * self.pt[q] + alpha * d[1][q];
                for j in 2..=m {
                    d[j][q] += alpha * (d[j + 1][q] - d[j - 1][q]);
                    acc[q] += d[j][q] * b[j];
                }
                for j in (2..=m + 1).rev() {
                    d[j][q] = d[j - 1][q];
                }
            }
            self.pt[1..].copy_from_slice(&acc);
            let (x, out) = pade_sum(x, &self.pt);
            self.pt[0] = x;
            out + x
        }
    }

    fn mixed_signal(n: usize) -> Vec<f64> {
        let mut noise = NoiseSource::with_seed(11);
        (0..n)
            .map(|i| {
                let pulse = if i % 37 == 0 { 6.0 } else { 0.0 };
                pulse + noise.gaussian()
            })
            .collect()
    }

    #[test]
    fn ring_matches_shifting_delay_lines() {
        for order in [1usize, 2, 3, 7, 24] {
            let alpha = 0.42;
            let b: Vec<f64> = (0..=order)
                .map(|k| 0.3 / (k as f64 + 1.0) * if k % 2 == 0 { 1.0 } else { -1.0 })
                .collect();
            let mut ring = SecondStage::new(order);
            let mut shifting = ShiftingSecondStage::new(order);
            for (i, x) in mixed_signal(400).into_iter().enumerate() {
                let a = ring.step(x, &b, alpha);
                let s = shifting.step(x, &b, alpha);
                assert_eq!(a.to_bits(), s.to_bits(), "order {order}, sample {i}");
            }
        }
    }

    #[test]
    fn zero_coefficients_pass_the_input_through() {
        let mut filter = MlsaFilter::new(12, 0.42);
        for x in mixed_signal(200) {
            assert_eq!(filter.step(x), x);
        }
    }

    #[test]
    fn order_zero_is_raised_to_one() {
        let filter = MlsaFilter::new(0, 0.42);
        assert_eq!(filter.order(), 1);
        assert_eq!(filter.coefficients(), &[0.0, 0.0]);
    }

    #[test]
    fn set_coefficients_pads_with_zeros() {
        let mut filter = MlsaFilter::new(3, 0.42);
        filter.set_coefficients(&[1.0, 2.0, 3.0, 4.0]);
        filter.set_coefficients(&[5.0, 6.0]);
        assert_eq!(filter.coefficients(), &[5.0, 6.0, 0.0, 0.0]);
    }

    #[test]
    fn stable_filter_decays() {
        let mut filter = MlsaFilter::new(4, 0.42);
        filter.set_coefficients(&[0.0, 0.5, -0.2, 0.1, 0.05]);
        let mut tail = 0.0;
        for i in 0..2000 {
            let y = filter.step(if i == 0 { 1.0 } else { 0.0 });
            assert!(y.is_finite());
            if i >= 1900 {
                tail += y.abs();
            }
        }
        assert!(tail < 1e-6, "tail energy {tail}");
    }
}
