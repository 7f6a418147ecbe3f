//! Clustergen voice loading and MLSA vocoding in Rust.
//!
//! *NOTE*: This is _not_ a text-to-speech engine.
//! It loads the binary voice databases of statistical parametric (clustergen)
//! voices and turns frames of F0 and mel-cepstrum into 16-bit audio with a
//! mel log spectrum approximation (MLSA) filter. Predicting those frames from
//! text is left to a front end.
//!
//! ```no_run
//! use mlsa::{Track, VoiceModel, synthesize};
//!
//! let bytes = std::fs::read("voice.cgv")?;
//! let voice = VoiceModel::from_bytes(&bytes)?;
//! let params = Track::with_shift(26, 0.005, vec![vec![0.0; 26]; 200])?;
//! let wave = synthesize(&voice, &params, None, None)?.into_wave();
//! println!("{} samples", wave.num_samples());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## `no_std`
//!
//! This library is `no_std` compatible with the `libm` feature.
//! `alloc` is required.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(clippy::all, clippy::pedantic, unsafe_code)]
// fine for us since loss of precision/sign is not that imporatnt, as long as it's the same every time.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

#[cfg(all(feature = "std", feature = "libm"))]
compile_error!("Features \"std\" and \"libm\" are mutually exclusive.");

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("Must specify a math feature: either \"std\" or \"libm\".");

extern crate alloc;

mod math;
mod traits;
pub use traits::BasicFilter;

pub mod cart;
pub mod cepstrum;
pub mod error;
pub mod excitation;
pub mod mlsa;
pub mod noise;
pub mod reader;
pub mod stream;
pub mod track;
pub mod vocoder;
pub mod voice;
pub mod wave;
pub mod writer;

pub use cart::{Cart, CartNode, TreeValue};
pub use error::{FormatError, SynthesisError, WaveError};
pub use mlsa::MlsaFilter;
pub use noise::{Lcg, NoiseSource};
pub use reader::{BinaryReader, ByteSource, Limits};
pub use stream::{CallbackSink, DEFAULT_MIN_BUFFSIZE, StreamAction, StreamingSink};
pub use track::Track;
pub use vocoder::{Synthesis, Vocoder, VocoderConfig, synthesize, synthesize_with};
pub use voice::{LoadOptions, VoiceFeatures, VoiceFile, VoiceModel};
pub use wave::Wave;
pub use writer::BinaryWriter;
