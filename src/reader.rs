//! Primitive decoding of the clustergen voice data format.
//!
//! Everything is little-endian: 4-byte integers and floats, 2-byte shorts,
//! length-prefixed byte blocks. Every length read from the stream is checked
//! against [`Limits`] before anything is allocated for it.

use crate::cart::{Cart, CartNode, TreeValue, VAL_TYPE_FLOAT, VAL_TYPE_STRING};
use crate::error::FormatError;
use alloc::{string::String, vec::Vec};
use byteorder::{ByteOrder, LittleEndian};

/// Length of the header magic, including its NUL terminator.
pub const MAGIC_LEN: usize = 26;

/// Header magic of a clustergen voice data stream.
pub const VOICE_MAGIC: &[u8; MAGIC_LEN] = b"CMU_FLITE_CG_VOXDATA-v2.0\0";

/// Byte order check value written right after the magic.
pub const ENDIAN_TAG: i32 = 1;

/// Largest piece of a block read (and allocated) in one go.
const CHUNK_LEN: usize = 64 * 1024;

/// Cap on capacity reserved up front from a count field.
const PREALLOC_LIMIT: usize = 1024;

/// Upper bounds for lengths and counts decoded from a voice stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// largest accepted byte block
    pub max_block_len: usize,
    /// largest accepted element count (rows, nodes, strings)
    pub max_count: usize,
    /// longest accepted frame advance, in milliseconds
    pub max_frame_advance_ms: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_block_len: 16 * 1024 * 1024,
            max_count: 1 << 20,
            max_frame_advance_ms: 1000,
        }
    }
}

/// Why a [`ByteSource`] could not fill a buffer.
#[derive(Debug)]
pub enum SourceError {
    /// The source ran out of bytes.
    Eof,
    #[cfg(feature = "std")]
    Io(std::io::Error),
}

/// Something voice data can be read from.
pub trait ByteSource {
    /// Fills `buf` completely.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Eof`] if fewer than `buf.len()` bytes remain.
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), SourceError>;
}

#[cfg(feature = "std")]
impl<R: std::io::Read + ?Sized> ByteSource for R {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        self.read_exact(buf).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                SourceError::Eof
            } else {
                SourceError::Io(err)
            }
        })
    }
}

#[cfg(not(feature = "std"))]
impl ByteSource for &[u8] {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        if self.len() < buf.len() {
            *self = &[];
            return Err(SourceError::Eof);
        }
        let (head, tail) = self.split_at(buf.len());
        buf.copy_from_slice(head);
        *self = tail;
        Ok(())
    }
}

#[cfg(not(feature = "std"))]
impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), SourceError> {
        (**self).fill(buf)
    }
}

/// A fixed-size array element stored little-endian.
pub trait Element: Copy {
    /// Encoded size in bytes.
    const SIZE: usize;
    /// Decodes one element from exactly [`Element::SIZE`] bytes.
    fn decode(bytes: &[u8]) -> Self;
    /// Encodes one element into exactly [`Element::SIZE`] bytes.
    fn encode(self, bytes: &mut [u8]);
}

impl Element for u16 {
    const SIZE: usize = 2;
    fn decode(bytes: &[u8]) -> Self {
        LittleEndian::read_u16(bytes)
    }
    fn encode(self, bytes: &mut [u8]) {
        LittleEndian::write_u16(bytes, self);
    }
}

impl Element for f32 {
    const SIZE: usize = 4;
    fn decode(bytes: &[u8]) -> Self {
        LittleEndian::read_f32(bytes)
    }
    fn encode(self, bytes: &mut [u8]) {
        LittleEndian::write_f32(bytes, self);
    }
}

impl Element for f64 {
    const SIZE: usize = 8;
    fn decode(bytes: &[u8]) -> Self {
        LittleEndian::read_f64(bytes)
    }
    fn encode(self, bytes: &mut [u8]) {
        LittleEndian::write_f64(bytes, self);
    }
}

/// Reads voice data primitives from a [`ByteSource`].
///
/// A short read is always an error; no primitive ever substitutes zero for
/// missing bytes.
pub struct BinaryReader<S> {
    source: S,
    offset: u64,
    limits: Limits,
}

impl<S: ByteSource> BinaryReader<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_limits(source, Limits::default())
    }

    #[must_use]
    pub fn with_limits(source: S, limits: Limits) -> Self {
        BinaryReader {
            source,
            offset: 0,
            limits,
        }
    }

    /// Number of bytes consumed so far.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn limits(&self) -> Limits {
        self.limits
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.source
    }

    fn fill(&mut self, buf: &mut [u8], what: &'static str) -> Result<(), FormatError> {
        let offset = self.offset;
        match self.source.fill(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(SourceError::Eof) => Err(FormatError::UnexpectedEof { what, offset }),
            #[cfg(feature = "std")]
            Err(SourceError::Io(err)) => Err(FormatError::Io(err)),
        }
    }

    pub fn read_u8(&mut self, what: &'static str) -> Result<u8, FormatError> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf, what)?;
        Ok(buf[0])
    }

    pub fn read_i16(&mut self, what: &'static str) -> Result<i16, FormatError> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf, what)?;
        Ok(LittleEndian::read_i16(&buf))
    }

    pub fn read_i32(&mut self, what: &'static str) -> Result<i32, FormatError> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf, what)?;
        Ok(LittleEndian::read_i32(&buf))
    }

    pub fn read_f32(&mut self, what: &'static str) -> Result<f32, FormatError> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf, what)?;
        Ok(LittleEndian::read_f32(&buf))
    }

    /// Reads an `i32` that must not be negative.
    pub fn read_unsigned(&mut self, what: &'static str) -> Result<u32, FormatError> {
        let offset = self.offset;
        let len = self.read_i32(what)?;
        u32::try_from(len).map_err(|_| FormatError::NegativeLength { what, len, offset })
    }

    fn read_len(&mut self, what: &'static str, limit: usize) -> Result<usize, FormatError> {
        let len = self.read_unsigned(what)? as usize;
        if len > limit {
            return Err(FormatError::LengthTooLarge { what, len, limit });
        }
        Ok(len)
    }

    /// Reads an element count bounded by [`Limits::max_count`].
    pub fn read_count(&mut self, what: &'static str) -> Result<usize, FormatError> {
        self.read_len(what, self.limits.max_count)
    }

    /// Reads a length-prefixed byte block.
    pub fn read_padded(&mut self, what: &'static str) -> Result<Vec<u8>, FormatError> {
        let len = self.read_len(what, self.limits.max_block_len)?;
        let mut block = Vec::with_capacity(len.min(CHUNK_LEN));
        while block.len() < len {
            let start = block.len();
            let end = start + (len - start).min(CHUNK_LEN);
            block.resize(end, 0);
            self.fill(&mut block[start..end], what)?;
        }
        Ok(block)
    }

    /// Reads a block holding a C string. Bytes from the first NUL on are dropped.
    pub fn read_string(&mut self, what: &'static str) -> Result<String, FormatError> {
        let mut bytes = self.read_padded(what)?;
        if let Some(end) = bytes.iter().position(|&b| b == 0) {
            bytes.truncate(end);
        }
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }

    pub fn read_string_array(&mut self, what: &'static str) -> Result<Vec<String>, FormatError> {
        let count = self.read_count(what)?;
        let mut strings = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            strings.push(self.read_string(what)?);
        }
        Ok(strings)
    }

    /// Reads a byte block and decodes it as a flat array of `T`.
    pub fn read_array<T: Element>(&mut self, what: &'static str) -> Result<Vec<T>, FormatError> {
        let block = self.read_padded(what)?;
        if block.len() % T::SIZE != 0 {
            return Err(FormatError::Misaligned {
                what,
                len: block.len(),
                element_size: T::SIZE,
            });
        }
        Ok(block.chunks_exact(T::SIZE).map(T::decode).collect())
    }

    /// Reads a row count followed by that many arrays.
    ///
    /// A row count of zero stands for a null matrix and yields `None`.
    pub fn read_2d_array<T: Element>(
        &mut self,
        what: &'static str,
    ) -> Result<Option<Vec<Vec<T>>>, FormatError> {
        let rows = self.read_count(what)?;
        if rows == 0 {
            return Ok(None);
        }
        let mut matrix = Vec::with_capacity(rows.min(PREALLOC_LIMIT));
        for _ in 0..rows {
            matrix.push(self.read_array(what)?);
        }
        Ok(Some(matrix))
    }

    /// Reads one tree: its nodes, then its feature name table.
    pub fn read_tree(&mut self) -> Result<Cart, FormatError> {
        let count = self.read_count("tree node count")?;
        let mut nodes = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            let feat = self.read_u8("tree node feature")?;
            let op = self.read_u8("tree node operator")?;
            let no_node = self.read_i16("tree node jump")?;
            let value = match self.read_i16("tree node value type")? {
                VAL_TYPE_STRING => TreeValue::Str(self.read_string("tree node value")?),
                VAL_TYPE_FLOAT => TreeValue::Float(self.read_f32("tree node value")?),
                _ => TreeValue::Int(self.read_i32("tree node value")?),
            };
            nodes.push(CartNode {
                feat,
                op,
                no_node,
                value,
            });
        }
        let feat_table = self.read_string_array("tree feature table")?;
        Ok(Cart { nodes, feat_table })
    }

    pub fn read_tree_array(&mut self, what: &'static str) -> Result<Vec<Cart>, FormatError> {
        let count = self.read_count(what)?;
        let mut trees = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            trees.push(self.read_tree()?);
        }
        Ok(trees)
    }

    /// Checks the magic string and the byte order tag.
    ///
    /// Only the fixed-size magic buffer is allocated before both checks pass.
    pub fn read_header(&mut self) -> Result<(), FormatError> {
        let mut magic = [0u8; MAGIC_LEN];
        self.fill(&mut magic, "header magic")?;
        if &magic != VOICE_MAGIC {
            return Err(FormatError::BadMagic);
        }
        let found = self.read_i32("endianness tag")?;
        if found != ENDIAN_TAG {
            return Err(FormatError::EndiannessMismatch {
                found,
                expected: ENDIAN_TAG,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::BinaryWriter;
    use alloc::{string::ToString, vec};

    fn reader(bytes: &[u8]) -> BinaryReader<&[u8]> {
        BinaryReader::new(bytes)
    }

    #[test]
    fn short_reads_are_errors() {
        let mut r = reader(&[1, 0]);
        let err = r.read_i32("num_types").unwrap_err();
        assert!(matches!(
            err,
            FormatError::UnexpectedEof {
                what: "num_types",
                offset: 0
            }
        ));
    }

    #[test]
    fn primitives_are_little_endian() {
        let mut r = reader(&[0x01, 0x02, 0x03, 0x04, 0xfe, 0xff, 0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(r.read_i32("int").unwrap(), 0x0403_0201);
        assert_eq!(r.read_i16("short").unwrap(), -2);
        assert_eq!(r.read_f32("float").unwrap(), 1.0);
        assert_eq!(r.offset(), 10);
    }

    #[test]
    fn negative_block_length_is_rejected() {
        let mut w = BinaryWriter::new();
        w.write_i32(-4);
        let bytes = w.into_bytes();
        let err = reader(&bytes).read_padded("name").unwrap_err();
        assert!(matches!(err, FormatError::NegativeLength { len: -4, .. }));
    }

    #[test]
    fn huge_block_length_is_rejected_before_reading() {
        let mut w = BinaryWriter::new();
        w.write_i32(i32::MAX);
        let bytes = w.into_bytes();
        let err = reader(&bytes).read_padded("name").unwrap_err();
        assert!(matches!(err, FormatError::LengthTooLarge { .. }));
    }

    #[test]
    fn lying_block_length_fails_on_short_stream() {
        let limits = Limits {
            max_block_len: usize::MAX,
            max_count: 16,
            ..Limits::default()
        };
        let mut w = BinaryWriter::new();
        w.write_i32(1 << 30);
        w.write_u8(7);
        let bytes = w.into_bytes();
        let err = BinaryReader::with_limits(&bytes[..], limits)
            .read_padded("blob")
            .unwrap_err();
        assert!(matches!(err, FormatError::UnexpectedEof { what: "blob", .. }));
    }

    #[test]
    fn strings_stop_at_the_first_nul() {
        let mut w = BinaryWriter::new();
        w.write_padded(b"ah\0junk").unwrap();
        let bytes = w.into_bytes();
        assert_eq!(reader(&bytes).read_string("phone").unwrap(), "ah");
    }

    #[test]
    fn zero_rows_is_a_null_matrix() {
        let mut w = BinaryWriter::new();
        w.write_i32(0);
        w.write_i32(2);
        w.write_array::<u16>(&[1, 2]).unwrap();
        w.write_array::<u16>(&[]).unwrap();
        let bytes = w.into_bytes();
        let mut r = reader(&bytes);
        assert_eq!(r.read_2d_array::<u16>("vectors").unwrap(), None);
        assert_eq!(
            r.read_2d_array::<u16>("vectors").unwrap(),
            Some(vec![vec![1, 2], vec![]])
        );
    }

    #[test]
    fn odd_sized_float_block_is_misaligned() {
        let mut w = BinaryWriter::new();
        w.write_padded(&[0, 0, 0, 0, 0, 0]).unwrap();
        let bytes = w.into_bytes();
        let err = reader(&bytes).read_array::<f32>("model_min").unwrap_err();
        assert!(matches!(
            err,
            FormatError::Misaligned {
                len: 6,
                element_size: 4,
                ..
            }
        ));
    }

    #[test]
    fn tree_nodes_decode_by_type_tag() {
        let mut w = BinaryWriter::new();
        w.write_i32(4);
        for (tag, payload) in [(5i16, 0u8), (1, 1), (3, 2), (9, 3)] {
            w.write_u8(payload);
            w.write_u8(0);
            w.write_i16(i16::from(payload) + 1);
            w.write_i16(tag);
            match tag {
                5 => w.write_string("ax").unwrap(),
                3 => w.write_f32(0.25),
                _ => w.write_i32(-3),
            }
        }
        w.write_string_array(&["ph_vc", "n.name"]).unwrap();
        let bytes = w.into_bytes();
        let cart = reader(&bytes).read_tree().unwrap();
        assert_eq!(cart.len(), 4);
        assert_eq!(cart.nodes[0].value, TreeValue::Str("ax".to_string()));
        assert_eq!(cart.nodes[1].value, TreeValue::Int(-3));
        assert_eq!(cart.nodes[2].value, TreeValue::Float(0.25));
        // unknown tags carry an integer
        assert_eq!(cart.nodes[3].value, TreeValue::Int(-3));
        assert_eq!(cart.nodes[2].no_node, 3);
        assert_eq!(cart.feat_table, vec!["ph_vc", "n.name"]);
        assert!(cart.node(4).is_none());
    }

    #[test]
    fn header_checks_magic_then_endianness() {
        let mut w = BinaryWriter::new();
        w.write_header();
        let good = w.into_bytes();
        assert!(reader(&good).read_header().is_ok());

        let mut flipped = good.clone();
        flipped[MAGIC_LEN..].copy_from_slice(&ENDIAN_TAG.to_be_bytes());
        assert!(matches!(
            reader(&flipped).read_header(),
            Err(FormatError::EndiannessMismatch {
                found: 0x0100_0000,
                expected: 1
            })
        ));

        let mut bad = good;
        bad[0] = b'X';
        assert!(matches!(
            reader(&bad).read_header(),
            Err(FormatError::BadMagic)
        ));
    }

    #[test]
    fn header_check_can_be_retried() {
        let mut w = BinaryWriter::new();
        w.write_header();
        let bytes = w.into_bytes();
        for _ in 0..2 {
            assert!(reader(&bytes).read_header().is_ok());
        }
    }
}
