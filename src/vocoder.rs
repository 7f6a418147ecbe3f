//! Frame-by-frame MLSA vocoding of a parameter track.
//!
//! ## Per frame
//! ```text
//!    p    = sample_rate / f0                      pitch period, 0 when unvoiced
//!    cc   = mc2b(mcep), postfiltered              target coefficients
//!    cinc = (cc - c) / frame_length               per-sample coefficient step
//!    inc  = (p - p1) / frame_length               per-sample pitch step
//! ```
//! ## Per sample
//! ```text
//!    x = pulse or noise excitation
//!    x = x * exp(c[0]) * gain
//!    y = mlsa(x, c)
//!    p1 += inc, c += cinc
//! ```
//! The very first frame only primes `c` and `p1`; output lags the parameters
//! by one frame.

use crate::cepstrum::{Postfilter, mc2b};
use crate::error::SynthesisError;
use crate::excitation::{Excitation, MixedExcitation, PulseTrain};
use crate::math::exp;
use crate::mlsa::MlsaFilter;
use crate::noise::Lcg;
use crate::stream::{StreamAction, StreamingSink};
use crate::track::{DEFAULT_FRAME_SHIFT_MS, Track};
use crate::traits::BasicFilter;
use crate::voice::VoiceModel;
use crate::wave::Wave;
use alloc::{vec, vec::Vec};
use log::{debug, info, trace};
use rand::RngCore;

/// Voices at this rate get a fixed gain of 2 instead of their own.
const LOW_RATE: u32 = 8000;
const LOW_RATE_GAIN: f64 = 2.0;

/// Per-call vocoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocoderConfig {
    /// Gaussian noise for unvoiced frames; `false` selects random +1/-1.
    /// Mixed excitation always uses +1/-1.
    pub gaussian_noise: bool,
    /// Seed of the noise generator.
    pub seed: u64,
}

impl Default for VocoderConfig {
    fn default() -> Self {
        VocoderConfig {
            gaussian_noise: true,
            seed: 1,
        }
    }
}

/// Samples per frame for a frame shift in milliseconds.
#[must_use]
pub fn frame_length(shift_ms: f64, sample_rate: u32) -> usize {
    (0.5 + shift_ms * f64::from(sample_rate) / 1000.0) as usize
}

/// Converts a filter output to a sample.
///
/// Values beyond the `i16` range saturate, values inside it truncate toward
/// zero and NaN becomes silence, which is exactly what `as` does.
fn to_sample(y: f64) -> i16 {
    y as i16
}

/// Vocoder state for one utterance.
pub struct Vocoder<'a, R = Lcg> {
    alpha: f64,
    rate: f64,
    gain: f64,
    frame_length: usize,
    filter: MlsaFilter,
    /// mel-cepstrum of the current frame
    mc: Vec<f64>,
    /// coefficients the filter moves towards during a frame
    target: Vec<f64>,
    /// per-sample coefficient increment
    step: Vec<f64>,
    postfilter: Postfilter,
    /// `None` until the first frame has primed the state
    pulse: Option<PulseTrain>,
    excitation: Excitation<R>,
    mixed: Option<MixedExcitation<'a>>,
}

impl<'a> Vocoder<'a, Lcg> {
    /// A vocoder of cepstral order `order` for `model`.
    #[must_use]
    pub fn new(
        model: &'a VoiceModel,
        frame_length: usize,
        order: usize,
        config: &VocoderConfig,
    ) -> Self {
        Self::with_rng(
            model,
            frame_length,
            order,
            Lcg::new(config.seed),
            config.gaussian_noise,
        )
    }
}

impl<'a, R: RngCore> Vocoder<'a, R> {
    /// A vocoder drawing its noise from `rng`.
    pub fn with_rng(
        model: &'a VoiceModel,
        frame_length: usize,
        order: usize,
        rng: R,
        gaussian_noise: bool,
    ) -> Self {
        let filter = MlsaFilter::new(order, f64::from(model.mlsa_alpha));
        let order = filter.order();
        let gain = if model.sample_rate == LOW_RATE {
            LOW_RATE_GAIN
        } else {
            f64::from(model.effective_gain())
        };
        Vocoder {
            alpha: f64::from(model.mlsa_alpha),
            rate: f64::from(model.sample_rate),
            gain,
            frame_length,
            filter,
            mc: vec![0.0; order + 1],
            target: vec![0.0; order + 1],
            step: vec![0.0; order + 1],
            postfilter: Postfilter::new(order, model.mlsa_alpha, model.mlsa_beta),
            pulse: None,
            excitation: Excitation::new(rng, gaussian_noise),
            mixed: None,
        }
    }

    /// Switches to mixed excitation with band strength frames of `bands`
    /// values. This also switches unvoiced noise to +1/-1.
    ///
    /// # Errors
    ///
    /// Fails if the voice has no band filters or more bands than `bands`.
    pub fn with_mixed_excitation(
        mut self,
        model: &'a VoiceModel,
        bands: usize,
    ) -> Result<Self, SynthesisError> {
        if model.me_h.is_empty() || model.me_order == 0 || bands < model.me_num {
            return Err(SynthesisError::MixedExcitationUnavailable { bands });
        }
        self.mixed = Some(MixedExcitation::new(&model.me_h, model.me_order));
        self.excitation.set_gaussian(false);
        Ok(self)
    }

    #[must_use]
    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.filter.order()
    }

    #[must_use]
    pub fn is_primed(&self) -> bool {
        self.pulse.is_some()
    }

    /// Vocodes one frame into `out`.
    ///
    /// `mcep` holds the frame's mel-cepstral channels; the last coefficient of
    /// the filter is always zero. `strengths` are the frame's band strengths
    /// under mixed excitation. Returns the number of samples written: zero
    /// for the first frame, otherwise the frame length (capped by `out`).
    #[allow(clippy::many_single_char_names)]
    pub fn frame(
        &mut self,
        f0: f32,
        mcep: &[f32],
        strengths: Option<&[f32]>,
        out: &mut [i16],
    ) -> usize {
        let mut mixed = match (strengths, self.mixed.as_mut()) {
            (Some(strengths), Some(mixed)) => {
                mixed.set_strengths(strengths);
                Some(mixed)
            }
            _ => None,
        };

        let p = if f0 > 0.0 && f0.is_finite() {
            self.rate / f64::from(f0)
        } else {
            0.0
        };

        let m = self.mc.len() - 1;
        for (i, c) in self.mc.iter_mut().enumerate() {
            *c = if i < m {
                mcep.get(i).copied().map_or(0.0, f64::from)
            } else {
                0.0
            };
        }
        mc2b(&self.mc, &mut self.target, self.alpha);
        self.postfilter.apply(&mut self.target, &self.mc);

        let Some(pulse) = self.pulse.as_mut() else {
            self.filter.set_coefficients(&self.target);
            self.pulse = Some(PulseTrain {
                period: p,
                phase: p,
            });
            return 0;
        };

        let fprd = self.frame_length as f64;
        let c = self.filter.coefficients();
        for ((step, target), current) in self.step.iter_mut().zip(&self.target).zip(c) {
            *step = if self.frame_length == 0 {
                0.0
            } else {
                (target - current) / fprd
            };
        }

        let inc = if pulse.period != 0.0 && p != 0.0 {
            if self.frame_length == 0 {
                0.0
            } else {
                (p - pulse.period) / fprd
            }
        } else {
            pulse.phase = p;
            pulse.period = 0.0;
            0.0
        };

        let mut written = 0;
        for n in 0..self.frame_length {
            let mut x = if pulse.is_voiced() {
                let x = pulse.next_sample();
                match mixed.as_deref_mut() {
                    Some(mixed) => {
                        let noise = self.excitation.voiced_noise();
                        mixed.mix(x, noise)
                    }
                    None => x,
                }
            } else {
                let noise = self.excitation.unvoiced();
                match mixed.as_deref_mut() {
                    Some(mixed) => mixed.mix(0.0, noise),
                    None => noise,
                }
            };

            x *= exp(self.filter.coefficients()[0]) * self.gain;
            let y = self.filter.step(x);
            if let Some(sample) = out.get_mut(n) {
                *sample = to_sample(y);
                written += 1;
            }

            pulse.period += inc;
            for (c, step) in self.filter.coefficients_mut().iter_mut().zip(&self.step) {
                *c += step;
            }
        }

        pulse.period = p;
        self.filter.set_coefficients(&self.target);
        written
    }
}

/// Outcome of a synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
    /// All frames were synthesized.
    Complete(Wave),
    /// The sink asked to stop; holds the samples delivered so far.
    Cancelled(Wave),
}

impl Synthesis {
    #[must_use]
    pub fn wave(&self) -> &Wave {
        match self {
            Synthesis::Complete(wave) | Synthesis::Cancelled(wave) => wave,
        }
    }

    #[must_use]
    pub fn into_wave(self) -> Wave {
        match self {
            Synthesis::Complete(wave) | Synthesis::Cancelled(wave) => wave,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Synthesis::Cancelled(_))
    }
}

/// Synthesizes `params` (F0 plus mel-cepstrum per frame) with the default
/// [`VocoderConfig`].
///
/// `strengths`, when given, selects mixed excitation with one band strength
/// frame per parameter frame.
///
/// # Errors
///
/// Fails if the tracks do not fit each other or the voice.
pub fn synthesize(
    model: &VoiceModel,
    params: &Track,
    strengths: Option<&Track>,
    sink: Option<&mut dyn StreamingSink>,
) -> Result<Synthesis, SynthesisError> {
    synthesize_with(model, params, strengths, sink, &VocoderConfig::default())
}

/// Like [`synthesize`], with explicit settings.
///
/// # Errors
///
/// Fails if the tracks do not fit each other or the voice.
pub fn synthesize_with(
    model: &VoiceModel,
    params: &Track,
    strengths: Option<&Track>,
    mut sink: Option<&mut dyn StreamingSink>,
    config: &VocoderConfig,
) -> Result<Synthesis, SynthesisError> {
    let Some(order) = params.num_channels().checked_sub(1) else {
        return Err(SynthesisError::EmptyTrack);
    };
    let num_frames = params.num_frames();
    if let Some(strengths) = strengths
        && strengths.num_frames() < num_frames
    {
        return Err(SynthesisError::StrengthFrames {
            found: strengths.num_frames(),
            expected: num_frames,
        });
    }

    let shift_ms = params
        .frame_shift_ms()
        .or_else(|| (model.frame_advance > 0.0).then(|| f64::from(model.frame_advance) * 1000.0))
        .unwrap_or(DEFAULT_FRAME_SHIFT_MS);
    let frame_length = frame_length(shift_ms, model.sample_rate);

    let mut vocoder = Vocoder::new(model, frame_length, order, config);
    if let Some(strengths) = strengths {
        vocoder = vocoder.with_mixed_excitation(model, strengths.num_channels())?;
    }
    debug!(
        "vocoding {num_frames} frames of {frame_length} samples, order {}, {} excitation",
        vocoder.order(),
        match (strengths.is_some(), config.gaussian_noise) {
            (true, _) => "mixed",
            (false, true) => "gaussian",
            (false, false) => "binary",
        }
    );

    let too_long = || SynthesisError::WaveTooLong {
        frames: num_frames,
        frame_length,
    };
    let num_samples = num_frames.checked_mul(frame_length).ok_or_else(too_long)?;
    let mut wave = Wave::try_new(model.sample_rate, num_samples).map_err(|_| too_long())?;
    let mut pos = 0;
    let mut mark = 0;
    for (t, frame) in params.frames().iter().enumerate() {
        let strength = strengths.and_then(|s| s.frame(t));
        pos += vocoder.frame(
            frame[0],
            &frame[1..],
            strength,
            &mut wave.samples_mut()[pos..],
        );

        if let Some(sink) = sink.as_deref_mut()
            && pos - mark > sink.min_buffsize()
        {
            trace!("delivering samples {mark}..{pos}");
            let action = sink.deliver(&wave, mark, pos - mark, false);
            mark = pos;
            if action == StreamAction::Stop {
                info!("synthesis stopped by the sink after {pos} samples");
                wave.truncate(pos);
                return Ok(Synthesis::Cancelled(wave));
            }
        }
    }
    wave.truncate(pos);

    if let Some(sink) = sink {
        trace!("delivering final samples {mark}..{pos}");
        sink.deliver(&wave, mark, pos - mark, true);
    }
    debug!(
        "synthesized {pos} samples ({:.3} s)",
        wave.duration_secs()
    );
    Ok(Synthesis::Complete(wave))
}
