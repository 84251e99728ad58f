// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Canonical CBOR encoding.
//!
//! The encoder writes into any `std::io::Write`; map entries are staged as
//! [`MapEntry`] values (key bytes + value bytes encoded into ephemeral
//! buffers) so they can be produced in arbitrary source order and sorted
//! canonically before emission. The canonical-order rule lives in
//! [`Encoder::encode_map`], not in callers.

use std::io::Write;

use crate::MajorType;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to write CBOR output: {0}")]
    Io(#[from] std::io::Error),
}

/// A CBOR encoder over an arbitrary byte sink.
pub struct Encoder<W> {
    w: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(w: W) -> Self {
        Self { w }
    }

    /// Consume the encoder and hand back the underlying writer.
    pub fn into_writer(self) -> W {
        self.w
    }

    /// Write a major-type header with shortest-form length encoding:
    /// 0..=23 inline, then 1-, 2-, 4- or 8-byte big-endian arguments.
    fn encode_header(&mut self, major: MajorType, n: u64) -> Result<(), EncodeError> {
        let m = (major as u8) << 5;
        if n < 24 {
            self.w.write_all(&[m | n as u8])?;
        } else if n < (1 << 8) {
            self.w.write_all(&[m | 24, n as u8])?;
        } else if n < (1 << 16) {
            self.w.write_all(&[m | 25])?;
            self.w.write_all(&(n as u16).to_be_bytes())?;
        } else if n < (1 << 32) {
            self.w.write_all(&[m | 26])?;
            self.w.write_all(&(n as u32).to_be_bytes())?;
        } else {
            self.w.write_all(&[m | 27])?;
            self.w.write_all(&n.to_be_bytes())?;
        }
        Ok(())
    }

    /// Encode an unsigned integer (major type 0).
    pub fn encode_uint(&mut self, n: u64) -> Result<(), EncodeError> {
        self.encode_header(MajorType::UnsignedInt, n)
    }

    /// Encode a signed integer: major type 0 for `n >= 0`, major type 1 with
    /// argument `-1 - n` otherwise.
    pub fn encode_int(&mut self, n: i64) -> Result<(), EncodeError> {
        if n >= 0 {
            self.encode_header(MajorType::UnsignedInt, n as u64)
        } else {
            self.encode_header(MajorType::NegativeInt, !(n as u64))
        }
    }

    /// Encode a definite-length byte string (major type 2).
    pub fn encode_byte_string(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.encode_header(MajorType::ByteString, bytes.len() as u64)?;
        self.w.write_all(bytes)?;
        Ok(())
    }

    /// Encode a definite-length text string (major type 3).
    pub fn encode_text_string(&mut self, s: &str) -> Result<(), EncodeError> {
        self.encode_header(MajorType::TextString, s.len() as u64)?;
        self.w.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Encode an array header (major type 4). The caller is responsible for
    /// emitting exactly `len` items afterwards.
    pub fn encode_array_header(&mut self, len: u64) -> Result<(), EncodeError> {
        self.encode_header(MajorType::Array, len)
    }

    /// Encode a map from pre-encoded entries, sorted into canonical order:
    /// byte-wise lexicographic comparison of the encoded key bytes, shorter
    /// keys before longer ones when one is a prefix of the other.
    pub fn encode_map(&mut self, mut entries: Vec<MapEntry>) -> Result<(), EncodeError> {
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        self.encode_header(MajorType::Map, entries.len() as u64)?;
        for entry in &entries {
            self.w.write_all(&entry.key)?;
            self.w.write_all(&entry.value)?;
        }
        Ok(())
    }
}

/// One map entry, held as fully encoded key and value bytes.
///
/// Entries are built by running sub-encoders against owned buffers, which
/// makes the later canonical sort a plain comparison of byte sequences.
pub struct MapEntry {
    key: Vec<u8>,
    value: Vec<u8>,
}

impl MapEntry {
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    /// Convenience constructor: encode key and value through fresh buffer
    /// encoders handed to `f`.
    pub fn encoded<F>(f: F) -> Result<Self, EncodeError>
    where
        F: FnOnce(&mut Encoder<Vec<u8>>, &mut Encoder<Vec<u8>>) -> Result<(), EncodeError>,
    {
        let mut key = Encoder::new(Vec::new());
        let mut value = Encoder::new(Vec::new());
        f(&mut key, &mut value)?;
        Ok(Self::new(key.into_writer(), value.into_writer()))
    }

    pub fn key_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn value_bytes(&self) -> &[u8] {
        &self.value
    }
}
