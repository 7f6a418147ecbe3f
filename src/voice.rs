//! Loading and dumping clustergen voice models.
//!
//! A model is read field by field in file order; any failure discards
//! everything decoded so far. A [`VoiceModel`] therefore only exists once the
//! whole stream has been read and validated.

use crate::cart::Cart;
use crate::error::FormatError;
use crate::reader::{BinaryReader, ByteSource, Limits};
use crate::writer::BinaryWriter;
use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use log::debug;

/// Feature name that ends the feature list of a voice file.
pub const END_OF_FEATURES: &str = "end_of_features";

/// How to read a voice model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// parameter streams stored in the model
    pub num_param_models: usize,
    /// duration models stored in the model
    pub num_dur_models: usize,
    pub limits: Limits,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            num_param_models: 3,
            num_dur_models: 1,
            limits: Limits::default(),
        }
    }
}

/// One parameter stream: its trees and its quantized frame vectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamModel {
    pub num_channels: usize,
    pub num_frames: usize,
    pub trees: Vec<Cart>,
    /// `num_frames` rows of `num_channels` quantized values
    pub vectors: Vec<Vec<u16>>,
}

/// Statistical phrase and accent F0 model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpamF0 {
    pub accent_tree: Cart,
    pub phrase_tree: Cart,
    pub num_channels: usize,
    pub num_frames: usize,
    pub accent_vectors: Vec<Vec<f32>>,
}

/// Duration statistics of one phone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurStat {
    pub mean: f32,
    pub stddev: f32,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationModel {
    pub stats: Vec<DurStat>,
    pub cart: Cart,
}

/// A clustergen voice database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceModel {
    pub name: String,
    pub types: Vec<String>,
    pub num_types: i32,
    pub sample_rate: u32,
    pub f0_mean: f32,
    pub f0_stddev: f32,
    pub f0_trees: Vec<Cart>,
    pub param_models: Vec<ParamModel>,
    pub spamf0: Option<SpamF0>,
    /// per-channel offset of the quantized vectors
    pub model_min: Vec<f32>,
    /// per-channel range of the quantized vectors
    pub model_range: Vec<f32>,
    /// seconds per frame
    pub frame_advance: f32,
    pub dur_models: Vec<DurationModel>,
    pub phone_states: Vec<Vec<String>>,
    pub do_mlpg: bool,
    pub dynwin: Vec<f32>,
    pub dynwinsize: i32,
    pub mlsa_alpha: f32,
    pub mlsa_beta: f32,
    pub multimodel: bool,
    pub mixed_excitation: bool,
    pub me_num: usize,
    pub me_order: usize,
    /// mixed excitation band filters, `me_num` rows of `me_order` taps
    pub me_h: Vec<Vec<f64>>,
    /// output gain; zero means unset
    pub gain: f32,
}

impl VoiceModel {
    /// Loads a model with the default [`LoadOptions`].
    pub fn load<S: ByteSource>(source: S) -> Result<Self, FormatError> {
        Self::load_with(source, &LoadOptions::default())
    }

    pub fn load_with<S: ByteSource>(source: S, options: &LoadOptions) -> Result<Self, FormatError> {
        let mut reader = BinaryReader::with_limits(source, options.limits);
        reader.read_header()?;
        Self::read_body(&mut reader, options)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        Self::load(bytes)
    }

    /// Number of parameter streams left after dropping trailing null ones.
    #[must_use]
    pub fn num_param_models(&self) -> usize {
        self.param_models.len()
    }

    /// Gain applied to the output, `1.0` when the voice leaves it unset.
    #[must_use]
    pub fn effective_gain(&self) -> f32 {
        if self.gain == 0.0 { 1.0 } else { self.gain }
    }

    /// De-normalized value of one channel of one model frame.
    ///
    /// ```text
    ///    value = model_min[channel] + (q / 65535) * model_range[channel]
    /// ```
    #[must_use]
    pub fn model_value(&self, stream: usize, frame: usize, channel: usize) -> Option<f32> {
        let q = *self
            .param_models
            .get(stream)?
            .vectors
            .get(frame)?
            .get(channel)?;
        let min = f64::from(*self.model_min.get(channel)?);
        let range = f64::from(*self.model_range.get(channel)?);
        Some((min + (f64::from(q) / 65535.0) * range) as f32)
    }

    #[allow(clippy::too_many_lines)]
    pub(crate) fn read_body<S: ByteSource>(
        r: &mut BinaryReader<S>,
        options: &LoadOptions,
    ) -> Result<Self, FormatError> {
        let name = r.read_string("name")?;
        let types = r.read_string_array("types")?;
        let num_types = r.read_i32("num_types")?;
        let sample_rate = r.read_unsigned("sample_rate")?;
        let f0_mean = r.read_f32("f0_mean")?;
        let f0_stddev = r.read_f32("f0_stddev")?;
        let f0_trees = r.read_tree_array("f0_trees")?;

        let mut param_trees = Vec::new();
        for _ in 0..options.num_param_models {
            param_trees.push(r.read_tree_array("param_trees")?);
        }

        let has_spamf0 = r.read_i32("spamf0")? != 0;
        let spamf0_trees = if has_spamf0 {
            Some((r.read_tree()?, r.read_tree()?))
        } else {
            None
        };

        let mut param_models = Vec::new();
        let mut null_stream = None;
        for (stream, trees) in param_trees.into_iter().enumerate() {
            let num_channels = r.read_count("num_channels")?;
            let num_frames = r.read_count("num_frames")?;
            let vectors = r.read_2d_array::<u16>("model_vectors")?;
            match vectors {
                Some(vectors) if null_stream.is_none() => param_models.push(ParamModel {
                    num_channels,
                    num_frames,
                    trees,
                    vectors,
                }),
                None if null_stream.is_none() => null_stream = Some(stream),
                _ => {}
            }
        }
        if let Some(stream) = null_stream {
            debug!(
                "parameter stream {stream} has no model vectors, using {} of {} streams",
                param_models.len(),
                options.num_param_models
            );
        }
        for (stream, model) in param_models.iter().enumerate() {
            check_channels(stream, model)?;
        }

        let spamf0 = match spamf0_trees {
            Some((accent_tree, phrase_tree)) => {
                let num_channels = r.read_count("num_channels_spamf0_accent")?;
                let num_frames = r.read_count("num_frames_spamf0_accent")?;
                let accent_vectors = r
                    .read_2d_array::<f32>("spamf0_accent_vectors")?
                    .unwrap_or_default();
                Some(SpamF0 {
                    accent_tree,
                    phrase_tree,
                    num_channels,
                    num_frames,
                    accent_vectors,
                })
            }
            None => None,
        };

        let model_min = r.read_array::<f32>("model_min")?;
        let model_range = r.read_array::<f32>("model_range")?;
        let frame_advance = r.read_f32("frame_advance")?;
        check_frame_advance(frame_advance, r.limits())?;

        let mut dur_models = Vec::new();
        for _ in 0..options.num_dur_models {
            let count = r.read_count("dur_stats")?;
            let mut stats = Vec::new();
            for _ in 0..count {
                stats.push(DurStat {
                    mean: r.read_f32("dur_stat mean")?,
                    stddev: r.read_f32("dur_stat stddev")?,
                    phone: r.read_string("dur_stat phone")?,
                });
            }
            let cart = r.read_tree()?;
            dur_models.push(DurationModel { stats, cart });
        }

        let count = r.read_count("phone_states")?;
        let mut phone_states = Vec::new();
        for _ in 0..count {
            phone_states.push(r.read_string_array("phone_states")?);
        }

        let do_mlpg = r.read_i32("do_mlpg")? != 0;
        let dynwin = r.read_array::<f32>("dynwin")?;
        let dynwinsize = r.read_i32("dynwinsize")?;
        let mlsa_alpha = r.read_f32("mlsa_alpha")?;
        let mlsa_beta = r.read_f32("mlsa_beta")?;
        let multimodel = r.read_i32("multimodel")? != 0;
        let mixed_excitation = r.read_i32("mixed_excitation")? != 0;
        let me_num = r.read_count("me_num")?;
        let me_order = r.read_count("me_order")?;
        let me_h = r.read_2d_array::<f64>("me_h")?.unwrap_or_default();
        check_excitation_shape(&me_h, me_num, me_order)?;

        let spamf0_again = r.read_i32("spamf0")? != 0;
        if spamf0_again != has_spamf0 {
            debug!("repeated spamf0 flag {spamf0_again} disagrees with {has_spamf0}, keeping the first");
        }
        let gain = r.read_f32("gain")?;

        let model = VoiceModel {
            name,
            types,
            num_types,
            sample_rate,
            f0_mean,
            f0_stddev,
            f0_trees,
            param_models,
            spamf0,
            model_min,
            model_range,
            frame_advance,
            dur_models,
            phone_states,
            do_mlpg,
            dynwin,
            dynwinsize,
            mlsa_alpha,
            mlsa_beta,
            multimodel,
            mixed_excitation,
            me_num,
            me_order,
            me_h,
            gain,
        };
        debug!(
            "loaded voice {:?}: {} Hz, {} parameter streams, alpha {}, beta {}, mixed excitation {}",
            model.name,
            model.sample_rate,
            model.num_param_models(),
            model.mlsa_alpha,
            model.mlsa_beta,
            model.mixed_excitation,
        );
        Ok(model)
    }

    /// Dumps the model, header included.
    ///
    /// The dump holds `num_param_models()` streams and `dur_models.len()`
    /// duration models; load it back with matching [`LoadOptions`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut w = BinaryWriter::new();
        w.write_header();
        self.write_body(&mut w)?;
        Ok(w.into_bytes())
    }

    /// Options that read back what [`VoiceModel::to_bytes`] writes.
    #[must_use]
    pub fn dump_options(&self) -> LoadOptions {
        LoadOptions {
            num_param_models: self.num_param_models(),
            num_dur_models: self.dur_models.len(),
            limits: Limits::default(),
        }
    }

    pub(crate) fn write_body(&self, w: &mut BinaryWriter) -> Result<(), FormatError> {
        w.write_string(&self.name)?;
        w.write_string_array(&self.types)?;
        w.write_i32(self.num_types);
        w.write_len("sample_rate", self.sample_rate as usize)?;
        w.write_f32(self.f0_mean);
        w.write_f32(self.f0_stddev);
        w.write_tree_array(&self.f0_trees)?;
        for model in &self.param_models {
            w.write_tree_array(&model.trees)?;
        }
        w.write_i32(i32::from(self.spamf0.is_some()));
        if let Some(spamf0) = &self.spamf0 {
            w.write_tree(&spamf0.accent_tree)?;
            w.write_tree(&spamf0.phrase_tree)?;
        }
        for model in &self.param_models {
            w.write_len("num_channels", model.num_channels)?;
            w.write_len("num_frames", model.num_frames)?;
            w.write_2d_array(Some(model.vectors.as_slice()))?;
        }
        if let Some(spamf0) = &self.spamf0 {
            w.write_len("num_channels_spamf0_accent", spamf0.num_channels)?;
            w.write_len("num_frames_spamf0_accent", spamf0.num_frames)?;
            w.write_2d_array(Some(spamf0.accent_vectors.as_slice()))?;
        }
        w.write_array(&self.model_min)?;
        w.write_array(&self.model_range)?;
        w.write_f32(self.frame_advance);
        for dur in &self.dur_models {
            w.write_len("dur_stats", dur.stats.len())?;
            for stat in &dur.stats {
                w.write_f32(stat.mean);
                w.write_f32(stat.stddev);
                w.write_string(&stat.phone)?;
            }
            w.write_tree(&dur.cart)?;
        }
        w.write_len("phone_states", self.phone_states.len())?;
        for states in &self.phone_states {
            w.write_string_array(states)?;
        }
        w.write_i32(i32::from(self.do_mlpg));
        w.write_array(&self.dynwin)?;
        w.write_i32(self.dynwinsize);
        w.write_f32(self.mlsa_alpha);
        w.write_f32(self.mlsa_beta);
        w.write_i32(i32::from(self.multimodel));
        w.write_i32(i32::from(self.mixed_excitation));
        w.write_len("me_num", self.me_num)?;
        w.write_len("me_order", self.me_order)?;
        w.write_2d_array(Some(self.me_h.as_slice()))?;
        w.write_i32(i32::from(self.spamf0.is_some()));
        w.write_f32(self.gain);
        Ok(())
    }
}

fn check_channels(stream: usize, model: &ParamModel) -> Result<(), FormatError> {
    match model
        .vectors
        .iter()
        .position(|row| row.len() != model.num_channels)
    {
        Some(frame) => Err(FormatError::ChannelMismatch {
            stream,
            frame,
            found: model.vectors[frame].len(),
            expected: model.num_channels,
        }),
        None => Ok(()),
    }
}

fn check_frame_advance(value: f32, limits: Limits) -> Result<(), FormatError> {
    let ms = f64::from(value) * 1000.0;
    if value > 0.0 && value.is_finite() && ms <= f64::from(limits.max_frame_advance_ms) {
        Ok(())
    } else {
        Err(FormatError::BadFrameAdvance {
            value,
            limit_ms: limits.max_frame_advance_ms,
        })
    }
}

fn check_excitation_shape(
    me_h: &[Vec<f64>],
    me_num: usize,
    me_order: usize,
) -> Result<(), FormatError> {
    let bad_row = me_h.iter().find(|row| row.len() != me_order);
    if me_h.len() != me_num || bad_row.is_some() {
        return Err(FormatError::ExcitationShape {
            rows: me_h.len(),
            columns: bad_row.or(me_h.first()).map_or(0, Vec::len),
            me_num,
            me_order,
        });
    }
    Ok(())
}

/// Name/value features stored in front of a voice file's model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceFeatures {
    entries: Vec<(String, String)>,
}

impl VoiceFeatures {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a feature; a later value for the same name shadows earlier ones.
    pub fn set(&mut self, name: &str, value: &str) {
        self.entries.push((name.to_string(), value.to_string()));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.get(name)?.trim().parse().ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stream and duration model counts, where the features give them.
    fn apply_to(&self, options: &mut LoadOptions) {
        let count = |name: &str| self.get_int(name).and_then(|n| usize::try_from(n).ok());
        if let Some(n) = count("num_param_models") {
            options.num_param_models = n;
        }
        if let Some(n) = count("num_dur_models") {
            options.num_dur_models = n;
        }
    }
}

/// A complete voice file: features followed by the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceFile {
    pub features: VoiceFeatures,
    pub model: VoiceModel,
}

impl VoiceFile {
    pub fn load<S: ByteSource>(source: S) -> Result<Self, FormatError> {
        Self::load_with(source, &LoadOptions::default())
    }

    /// Loads a voice file. `num_param_models` and `num_dur_models` features
    /// override the counts in `options`.
    pub fn load_with<S: ByteSource>(source: S, options: &LoadOptions) -> Result<Self, FormatError> {
        let mut r = BinaryReader::with_limits(source, options.limits);
        r.read_header()?;
        let mut features = VoiceFeatures::new();
        loop {
            let name = r.read_string("feature name")?;
            let value = r.read_string("feature value")?;
            if name == END_OF_FEATURES {
                break;
            }
            if features.len() >= options.limits.max_count {
                return Err(FormatError::LengthTooLarge {
                    what: "voice features",
                    len: features.len() + 1,
                    limit: options.limits.max_count,
                });
            }
            features.entries.push((name, value));
        }
        let mut options = *options;
        features.apply_to(&mut options);
        debug!(
            "voice file has {} features, reading {} parameter streams",
            features.len(),
            options.num_param_models
        );
        let model = VoiceModel::read_body(&mut r, &options)?;
        Ok(VoiceFile { features, model })
    }

    /// Dumps the file. The stream and duration model counts are written as
    /// features so the dump loads back as is.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut w = BinaryWriter::new();
        w.write_header();
        for (name, value) in self.features.iter() {
            if name != "num_param_models" && name != "num_dur_models" {
                w.write_string(name)?;
                w.write_string(value)?;
            }
        }
        w.write_string("num_param_models")?;
        w.write_string(&self.model.num_param_models().to_string())?;
        w.write_string("num_dur_models")?;
        w.write_string(&self.model.dur_models.len().to_string())?;
        w.write_string(END_OF_FEATURES)?;
        w.write_string("")?;
        self.model.write_body(&mut w)?;
        Ok(w.into_bytes())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cart::{CartNode, TreeValue};
    use crate::reader::MAGIC_LEN;
    use alloc::vec;

    fn leaf(value: f32) -> Cart {
        Cart {
            nodes: vec![CartNode {
                feat: 0,
                op: 0,
                no_node: 0,
                value: TreeValue::Float(value),
            }],
            feat_table: vec!["name".to_string()],
        }
    }

    fn stream(num_channels: usize, rows: &[&[u16]]) -> ParamModel {
        ParamModel {
            num_channels,
            num_frames: rows.len(),
            trees: vec![leaf(1.0)],
            vectors: rows.iter().map(|r| r.to_vec()).collect(),
        }
    }

    /// A small but complete voice.
    pub(crate) fn sample_voice() -> VoiceModel {
        VoiceModel {
            name: "tiny".to_string(),
            types: vec!["aa_1".to_string(), "pau_1".to_string()],
            num_types: 2,
            sample_rate: 16000,
            f0_mean: 110.0,
            f0_stddev: 15.0,
            f0_trees: vec![leaf(0.5)],
            param_models: vec![
                stream(3, &[&[0, 65535, 32768], &[1, 2, 3]]),
                stream(3, &[&[4, 5, 6]]),
                stream(3, &[&[7, 8, 9]]),
            ],
            spamf0: Some(SpamF0 {
                accent_tree: leaf(2.0),
                phrase_tree: leaf(3.0),
                num_channels: 2,
                num_frames: 1,
                accent_vectors: vec![vec![0.25, -0.5]],
            }),
            model_min: vec![-1.0, 0.0, 10.0],
            model_range: vec![2.0, 1.0, 0.0],
            frame_advance: 0.005,
            dur_models: vec![DurationModel {
                stats: vec![DurStat {
                    mean: 0.08,
                    stddev: 0.02,
                    phone: "aa".to_string(),
                }],
                cart: leaf(0.1),
            }],
            phone_states: vec![vec!["aa".to_string(), "aa_1".to_string()]],
            do_mlpg: true,
            dynwin: vec![-0.5, 0.0, 0.5],
            dynwinsize: 3,
            mlsa_alpha: 0.42,
            mlsa_beta: 0.0,
            multimodel: false,
            mixed_excitation: true,
            me_num: 2,
            me_order: 3,
            me_h: vec![vec![0.5, 0.25, 0.0], vec![0.0, -0.25, 0.5]],
            gain: 0.0,
        }
    }

    #[test]
    fn dump_loads_back_unchanged() {
        let voice = sample_voice();
        let bytes = voice.to_bytes().unwrap();
        assert_eq!(VoiceModel::from_bytes(&bytes).unwrap(), voice);
    }

    #[test]
    fn trailing_null_streams_are_dropped() {
        let mut voice = sample_voice();
        voice.param_models[2].vectors.clear();
        let bytes = voice.to_bytes().unwrap();
        let loaded = VoiceModel::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.num_param_models(), 2);
        assert_eq!(loaded.param_models[..], voice.param_models[..2]);
        assert_eq!(loaded.gain, voice.gain);
    }

    #[test]
    fn streams_after_a_null_one_are_dropped_too() {
        let mut voice = sample_voice();
        voice.param_models[1].vectors.clear();
        let bytes = voice.to_bytes().unwrap();
        let loaded = VoiceModel::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.num_param_models(), 1);
        // the rest of the body is still read in step
        assert_eq!(loaded.me_h, voice.me_h);
    }

    #[test]
    fn row_width_must_match_channels() {
        let mut voice = sample_voice();
        voice.param_models[1].vectors[0].pop();
        let bytes = voice.to_bytes().unwrap();
        assert!(matches!(
            VoiceModel::from_bytes(&bytes),
            Err(FormatError::ChannelMismatch {
                stream: 1,
                frame: 0,
                found: 2,
                expected: 3
            })
        ));
    }

    #[test]
    fn excitation_taps_must_match_their_shape() {
        let mut voice = sample_voice();
        voice.me_order = 4;
        let bytes = voice.to_bytes().unwrap();
        assert!(matches!(
            VoiceModel::from_bytes(&bytes),
            Err(FormatError::ExcitationShape {
                rows: 2,
                columns: 3,
                me_num: 2,
                me_order: 4
            })
        ));
    }

    #[test]
    fn frame_advance_must_be_a_sane_period() {
        for bad in [0.0, -0.005, f32::NAN, f32::INFINITY, 1e30, 1.5] {
            let mut voice = sample_voice();
            voice.frame_advance = bad;
            let bytes = voice.to_bytes().unwrap();
            match VoiceModel::from_bytes(&bytes) {
                Err(FormatError::BadFrameAdvance { limit_ms: 1000, .. }) => {}
                other => panic!("frame advance {bad}: {other:?}"),
            }
        }

        let mut voice = sample_voice();
        voice.frame_advance = 1.5;
        let bytes = voice.to_bytes().unwrap();
        let mut options = voice.dump_options();
        options.limits.max_frame_advance_ms = 2000;
        assert_eq!(VoiceModel::load_with(&bytes[..], &options).unwrap(), voice);
    }

    #[test]
    fn flipped_endianness_is_rejected() {
        let mut bytes = sample_voice().to_bytes().unwrap();
        bytes[MAGIC_LEN..MAGIC_LEN + 4].copy_from_slice(&[0, 0, 0, 1]);
        assert!(matches!(
            VoiceModel::from_bytes(&bytes),
            Err(FormatError::EndiannessMismatch { .. })
        ));
    }

    #[test]
    fn every_truncation_is_an_eof_error() {
        let bytes = sample_voice().to_bytes().unwrap();
        for cut in 0..bytes.len() {
            match VoiceModel::from_bytes(&bytes[..cut]) {
                Err(FormatError::UnexpectedEof { .. }) => {}
                other => panic!("cut at {cut}: {other:?}"),
            }
        }
    }

    #[test]
    fn negative_counts_are_rejected() {
        let mut bytes = sample_voice().to_bytes().unwrap();
        // the name length follows the header
        bytes[MAGIC_LEN + 4..MAGIC_LEN + 8].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(
            VoiceModel::from_bytes(&bytes),
            Err(FormatError::NegativeLength { what: "name", .. })
        ));
    }

    #[test]
    fn model_values_are_denormalized() {
        let voice = sample_voice();
        assert_eq!(voice.model_value(0, 0, 0), Some(-1.0));
        assert_eq!(voice.model_value(0, 0, 1), Some(1.0));
        assert_eq!(voice.model_value(0, 0, 2), Some(10.0));
        assert_eq!(voice.model_value(0, 2, 0), None);
        assert_eq!(voice.model_value(3, 0, 0), None);
        assert_eq!(voice.effective_gain(), 1.0);
    }

    #[test]
    fn voice_file_features_set_the_stream_count() {
        let mut voice = sample_voice();
        voice.param_models.truncate(2);
        let mut features = VoiceFeatures::new();
        features.set("language", "eng");
        features.set("num_param_models", "7");
        let file = VoiceFile {
            features,
            model: voice,
        };
        let bytes = file.to_bytes().unwrap();
        // the default of three streams would misread this body
        let loaded = VoiceFile::load(&bytes[..]).unwrap();
        assert_eq!(loaded.model, file.model);
        assert_eq!(loaded.features.get("language"), Some("eng"));
        assert_eq!(loaded.features.get_int("num_param_models"), Some(2));
    }

    #[test]
    fn later_features_shadow_earlier_ones() {
        let mut features = VoiceFeatures::new();
        features.set("gender", "female");
        features.set("gender", "male");
        features.set("age", " 30 ");
        assert_eq!(features.get("gender"), Some("male"));
        assert_eq!(features.get_int("age"), Some(30));
        assert_eq!(features.get_int("gender"), None);
        assert_eq!(features.get("pitch"), None);
    }

    #[test]
    fn model_is_shareable() {
        fn shareable<T: Send + Sync>() {}
        shareable::<VoiceModel>();
    }
}
