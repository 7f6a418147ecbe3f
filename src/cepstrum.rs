//! Mel-cepstrum transforms and the energy-preserving postfilter.
//!
//! ## Coefficient forms
//! ```text
//!    mc = mel-cepstrum, m+1 values
//!    b  = MLSA filter coefficients, m+1 values
//!    a  = all-pass constant (alpha)
//!
//!    b[m] = mc[m]
//!    b[k] = mc[k] - a * b[k+1]          k = m-1 .. 0
//! ```

use crate::math::{exp, ln};
use alloc::{vec, vec::Vec};

/// Length of the impulse response used for energy estimates.
pub const IR_LENGTH: usize = 64;

/// Converts mel-cepstrum to MLSA filter coefficients.
///
/// # Panics
///
/// Panics if `b` is shorter than `mc`.
pub fn mc2b(mc: &[f64], b: &mut [f64], alpha: f64) {
    let Some(m) = mc.len().checked_sub(1) else {
        return;
    };
    b[m] = mc[m];
    for k in (0..m).rev() {
        b[k] = mc[k] - alpha * b[k + 1];
    }
}

/// Converts MLSA filter coefficients back to mel-cepstrum.
///
/// # Panics
///
/// Panics if `mc` is shorter than `b`.
pub fn b2mc(b: &[f64], mc: &mut [f64], alpha: f64) {
    let Some(m) = b.len().checked_sub(1) else {
        return;
    };
    let mut d = b[m];
    mc[m] = d;
    for k in (0..m).rev() {
        mc[k] = b[k] + alpha * d;
        d = b[k];
    }
}

/// Frequency warping of a cepstrum by the all-pass constant `alpha`.
///
/// `cep` receives `cep.len()` output terms, which must be at least two.
pub fn freqt(mc: &[f64], cep: &mut [f64], alpha: f64) {
    let aa = 1.0 - alpha * alpha;
    cep.fill(0.0);
    if cep.len() < 2 {
        return;
    }
    for &coef in mc.iter().rev() {
        let mut prev = cep[0];
        cep[0] = coef + alpha * prev;
        let mut cur = cep[1];
        cep[1] = aa * prev + alpha * cur;
        for j in 2..cep.len() {
            prev = cur;
            cur = cep[j];
            cep[j] = prev + alpha * (cur - cep[j - 1]);
        }
    }
}

/// Minimum phase impulse response of a minimum phase cepstrum.
pub fn c2ir(cep: &[f64], ir: &mut [f64]) {
    let Some(first) = ir.first_mut() else {
        return;
    };
    *first = exp(cep.first().copied().unwrap_or(0.0));
    for n in 1..ir.len() {
        let mut d = 0.0;
        for k in 1..=n {
            d += k as f64 * cep.get(k).copied().unwrap_or(0.0) * ir[n - k];
        }
        ir[n] = d / n as f64;
    }
}

/// Scratch space for filter energy estimates.
#[derive(Debug, Clone)]
pub struct EnergyScratch {
    mc: Vec<f64>,
    cep: Vec<f64>,
    ir: Vec<f64>,
}

impl EnergyScratch {
    #[must_use]
    pub fn new(order: usize) -> Self {
        EnergyScratch {
            mc: vec![0.0; order + 1],
            cep: vec![0.0; IR_LENGTH],
            ir: vec![0.0; IR_LENGTH],
        }
    }

    /// Energy of the impulse response of the filter with coefficients `b`.
    ///
    /// The coefficients are turned back into a mel-cepstrum, unwarped, and
    /// the first [`IR_LENGTH`] terms of the impulse response are summed.
    pub fn b2en(&mut self, b: &[f64], alpha: f64) -> f64 {
        if self.mc.len() < b.len() {
            self.mc.resize(b.len(), 0.0);
        }
        let mc = &mut self.mc[..b.len()];
        b2mc(b, mc, alpha);
        freqt(mc, &mut self.cep, -alpha);
        c2ir(&self.cep, &mut self.ir);
        self.ir.iter().map(|v| v * v).sum()
    }
}

/// Formant emphasis applied to filter coefficients, keeping the energy.
#[derive(Debug, Clone)]
pub struct Postfilter {
    alpha: f64,
    beta: f32,
    /// alpha times beta, computed in single precision
    alpha_beta: f32,
    scratch: EnergyScratch,
}

impl Postfilter {
    #[must_use]
    pub fn new(order: usize, alpha: f32, beta: f32) -> Self {
        Postfilter {
            alpha: f64::from(alpha),
            beta,
            alpha_beta: beta * alpha,
            scratch: EnergyScratch::new(order),
        }
    }

    /// Whether the postfilter changes anything for a filter of order `m`.
    #[must_use]
    pub fn is_active(&self, m: usize) -> bool {
        self.beta > 0.0 && m > 1
    }

    /// Emphasises `b` in place. `mc` is the mel-cepstrum `b` was made from.
    ///
    /// ```text
    ///    b[1] -= beta * alpha * mc[2]
    ///    b[k] *= 1 + beta                  k >= 2
    ///    b[0] += ln(e_before / e_after) / 2
    /// ```
    /// The gain correction is skipped when either energy is not a positive
    /// finite number.
    pub fn apply(&mut self, b: &mut [f64], mc: &[f64]) {
        let m = b.len().saturating_sub(1);
        if !self.is_active(m) || mc.len() < 3 {
            return;
        }
        let e1 = self.scratch.b2en(b, self.alpha);
        b[1] -= f64::from(self.alpha_beta) * mc[2];
        let scale = 1.0 + f64::from(self.beta);
        for coef in &mut b[2..] {
            *coef *= scale;
        }
        let e2 = self.scratch.b2en(b, self.alpha);
        if e1 > 0.0 && e2 > 0.0 && e1.is_finite() && e2.is_finite() {
            b[0] += ln(e1 / e2) / 2.0;
        }
    }
}
