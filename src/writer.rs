//! Encoding of the clustergen voice data format.
//!
//! The mirror image of [`crate::reader`]: every primitive the reader decodes
//! can be written back, so a loaded voice can be re-dumped and test voices can
//! be built in memory.

use crate::cart::{Cart, TreeValue};
use crate::error::FormatError;
use crate::reader::{ENDIAN_TAG, Element, VOICE_MAGIC};
use alloc::vec::Vec;
use byteorder::{ByteOrder, LittleEndian};

/// Appends voice data primitives to a byte buffer.
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_i16(&mut self, v: i16) {
        let mut bytes = [0u8; 2];
        LittleEndian::write_i16(&mut bytes, v);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_i32(&mut self, v: i32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_i32(&mut bytes, v);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn write_f32(&mut self, v: f32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_f32(&mut bytes, v);
        self.buf.extend_from_slice(&bytes);
    }

    /// Writes a length or count field.
    pub fn write_len(&mut self, what: &'static str, len: usize) -> Result<(), FormatError> {
        let len = i32::try_from(len).map_err(|_| FormatError::LengthTooLarge {
            what,
            len,
            limit: i32::MAX as usize,
        })?;
        self.write_i32(len);
        Ok(())
    }

    pub fn write_padded(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        self.write_len("padded block", bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Writes a string as a NUL-terminated block.
    pub fn write_string(&mut self, s: &str) -> Result<(), FormatError> {
        self.write_len("string", s.len() + 1)?;
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    pub fn write_string_array<S: AsRef<str>>(&mut self, strings: &[S]) -> Result<(), FormatError> {
        self.write_len("string array", strings.len())?;
        for s in strings {
            self.write_string(s.as_ref())?;
        }
        Ok(())
    }

    pub fn write_array<T: Element>(&mut self, values: &[T]) -> Result<(), FormatError> {
        self.write_len("array", values.len() * T::SIZE)?;
        let start = self.buf.len();
        self.buf.resize(start + values.len() * T::SIZE, 0);
        for (v, chunk) in values
            .iter()
            .zip(self.buf[start..].chunks_exact_mut(T::SIZE))
        {
            v.encode(chunk);
        }
        Ok(())
    }

    /// Writes a matrix; `None` and an empty matrix both become a zero row count.
    pub fn write_2d_array<T: Element>(
        &mut self,
        rows: Option<&[Vec<T>]>,
    ) -> Result<(), FormatError> {
        let rows = rows.unwrap_or(&[]);
        self.write_len("matrix rows", rows.len())?;
        for row in rows {
            self.write_array(row)?;
        }
        Ok(())
    }

    pub fn write_tree(&mut self, cart: &Cart) -> Result<(), FormatError> {
        self.write_len("tree node count", cart.nodes.len())?;
        for node in &cart.nodes {
            self.write_u8(node.feat);
            self.write_u8(node.op);
            self.write_i16(node.no_node);
            self.write_i16(node.value.type_tag());
            match &node.value {
                TreeValue::Str(s) => self.write_string(s)?,
                TreeValue::Int(i) => self.write_i32(*i),
                TreeValue::Float(f) => self.write_f32(*f),
            }
        }
        self.write_string_array(&cart.feat_table)
    }

    pub fn write_tree_array(&mut self, trees: &[Cart]) -> Result<(), FormatError> {
        self.write_len("tree array", trees.len())?;
        for tree in trees {
            self.write_tree(tree)?;
        }
        Ok(())
    }

    pub fn write_header(&mut self) {
        self.buf.extend_from_slice(VOICE_MAGIC);
        self.write_i32(ENDIAN_TAG);
    }
}
