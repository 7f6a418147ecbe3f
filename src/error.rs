//! Error types for voice loading and synthesis.

use thiserror::Error;

/// Errors raised while decoding a voice model.
///
/// Any of these means the voice is unusable: no partially decoded model is
/// ever handed out.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The stream does not start with the voice data magic string.
    #[error("not a clustergen voice: bad header magic")]
    BadMagic,

    /// The voice was dumped with another byte order.
    #[error("endianness tag {found:#010x} does not match {expected:#010x}")]
    EndiannessMismatch {
        /// Tag found in the stream.
        found: i32,
        /// Tag this reader accepts.
        expected: i32,
    },

    /// The stream ended inside a field.
    #[error("unexpected end of voice data while reading {what} at byte {offset}")]
    UnexpectedEof {
        /// Field being read.
        what: &'static str,
        /// Byte offset where the read started.
        offset: u64,
    },

    /// A length or count field is negative.
    #[error("negative length {len} for {what} at byte {offset}")]
    NegativeLength {
        /// Field being read.
        what: &'static str,
        /// The decoded length.
        len: i32,
        /// Byte offset of the length field.
        offset: u64,
    },

    /// A length or count field exceeds the configured limit.
    #[error("length {len} for {what} exceeds the limit of {limit}")]
    LengthTooLarge {
        /// Field being read.
        what: &'static str,
        /// The decoded length.
        len: usize,
        /// The configured limit.
        limit: usize,
    },

    /// A typed array block is not a whole number of elements.
    #[error("{what} block of {len} bytes is not a multiple of {element_size}")]
    Misaligned {
        /// Field being read.
        what: &'static str,
        /// Block length in bytes.
        len: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },

    /// A model vector row does not have the stream's channel count.
    #[error("parameter stream {stream}, frame {frame}: {found} channels, expected {expected}")]
    ChannelMismatch {
        /// Parameter stream index.
        stream: usize,
        /// Frame (row) index.
        frame: usize,
        /// Channels found in the row.
        found: usize,
        /// Channels declared for the stream.
        expected: usize,
    },

    /// The mixed-excitation taps do not have the declared shape.
    #[error("mixed excitation taps are {rows}x{columns}, expected {me_num}x{me_order}")]
    ExcitationShape {
        /// Rows found.
        rows: usize,
        /// Columns found in the first offending row.
        columns: usize,
        /// Declared number of bands.
        me_num: usize,
        /// Declared filter order.
        me_order: usize,
    },

    /// The frame advance is not a positive time within the limit.
    #[error("frame advance of {value} s is not in (0, {limit_ms} ms]")]
    BadFrameAdvance {
        /// The decoded frame advance in seconds.
        value: f32,
        /// The configured limit.
        limit_ms: u32,
    },

    /// I/O error from the underlying reader.
    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when the inputs to a synthesis call do not fit together.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SynthesisError {
    /// The parameter track has no F0 channel.
    #[error("parameter track has no channels")]
    EmptyTrack,

    /// A frame does not have the track's channel count.
    #[error("frame {frame} has {found} values, expected {expected}")]
    FrameWidth {
        /// Frame index.
        frame: usize,
        /// Values found.
        found: usize,
        /// Channels declared for the track.
        expected: usize,
    },

    /// The band strength track is shorter than the parameter track.
    #[error("strength track has {found} frames, expected at least {expected}")]
    StrengthFrames {
        /// Frames in the strength track.
        found: usize,
        /// Frames in the parameter track.
        expected: usize,
    },

    /// The output wave would not fit in memory.
    #[error("{frames} frames of {frame_length} samples do not fit in memory")]
    WaveTooLong {
        /// Frames in the parameter track.
        frames: usize,
        /// Samples per frame.
        frame_length: usize,
    },

    /// Band strengths were given but the voice has no usable excitation taps.
    #[error("voice has no mixed excitation filters for {bands} bands")]
    MixedExcitationUnavailable {
        /// Bands in the strength track.
        bands: usize,
    },
}

/// Errors from wave buffer operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaveError {
    /// The two waves have different sample rates.
    #[error("sample rate mismatch: {0} vs {1}")]
    SampleRateMismatch(u32, u32),

    /// The two waves have different channel counts.
    #[error("channel count mismatch: {0} vs {1}")]
    ChannelMismatch(u16, u16),
}
