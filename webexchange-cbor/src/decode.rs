// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Strict decoding of the canonical CBOR subset.
//!
//! The decoder borrows its input slice and produces borrowed results where
//! possible. It only accepts items this codec's encoder can produce:
//! definite lengths, shortest-form integer arguments. Anything else is a
//! decode error naming the field that was expected.

use crate::MajorType;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected {expected}, found reserved major type 6 or 7")]
    UnsupportedMajorType { expected: &'static str },

    #[error("truncated input while reading {expected}")]
    Truncated { expected: &'static str },

    #[error("non-minimal integer encoding while reading {expected}")]
    NonMinimalInteger { expected: &'static str },

    #[error("indefinite length or reserved additional info while reading {expected}")]
    InvalidAdditionalInfo { expected: &'static str },

    #[error("{expected} length {len} exceeds remaining input")]
    LengthOutOfRange { expected: &'static str, len: u64 },

    #[error("text string is not valid UTF-8")]
    InvalidUtf8,
}

/// A CBOR decoder over a borrowed input slice.
pub struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current offset into the input, in bytes.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Remaining unread bytes.
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn take(&mut self, n: usize, expected: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated { expected });
        }
        let out = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Read one item header of the given major type and return its argument,
    /// rejecting non-minimal and indefinite-length encodings.
    fn decode_header(&mut self, major: MajorType, expected: &'static str) -> Result<u64, DecodeError> {
        let initial = self.take(1, expected)?[0];
        let found = match MajorType::from_initial_byte(initial) {
            Some(m) => m,
            None => return Err(DecodeError::UnsupportedMajorType { expected }),
        };
        if found != major {
            return Err(DecodeError::UnexpectedType {
                expected,
                found: found.name(),
            });
        }

        let info = initial & 0x1f;
        let n = match info {
            0..=23 => u64::from(info),
            24 => {
                let n = u64::from(self.take(1, expected)?[0]);
                if n < 24 {
                    return Err(DecodeError::NonMinimalInteger { expected });
                }
                n
            }
            25 => {
                let b = self.take(2, expected)?;
                let n = u64::from(u16::from_be_bytes([b[0], b[1]]));
                if n < (1 << 8) {
                    return Err(DecodeError::NonMinimalInteger { expected });
                }
                n
            }
            26 => {
                let b = self.take(4, expected)?;
                let n = u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]]));
                if n < (1 << 16) {
                    return Err(DecodeError::NonMinimalInteger { expected });
                }
                n
            }
            27 => {
                let b = self.take(8, expected)?;
                let n = u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]);
                if n < (1 << 32) {
                    return Err(DecodeError::NonMinimalInteger { expected });
                }
                n
            }
            _ => return Err(DecodeError::InvalidAdditionalInfo { expected }),
        };
        Ok(n)
    }

    /// Decode an unsigned integer (major type 0).
    pub fn decode_uint(&mut self) -> Result<u64, DecodeError> {
        self.decode_uint_expecting("unsigned integer")
    }

    /// Decode an unsigned integer, labelling errors with the caller's field
    /// name (e.g. `"section offset"`).
    pub fn decode_uint_expecting(&mut self, expected: &'static str) -> Result<u64, DecodeError> {
        self.decode_header(MajorType::UnsignedInt, expected)
    }

    /// Decode a definite-length byte string (major type 2).
    pub fn decode_byte_string(&mut self) -> Result<&'a [u8], DecodeError> {
        self.decode_byte_string_expecting("byte string")
    }

    pub fn decode_byte_string_expecting(
        &mut self,
        expected: &'static str,
    ) -> Result<&'a [u8], DecodeError> {
        let len = self.decode_header(MajorType::ByteString, expected)?;
        if len > self.remaining() as u64 {
            return Err(DecodeError::LengthOutOfRange { expected, len });
        }
        self.take(len as usize, expected)
    }

    /// Decode a definite-length text string (major type 3).
    pub fn decode_text_string(&mut self) -> Result<&'a str, DecodeError> {
        self.decode_text_string_expecting("text string")
    }

    pub fn decode_text_string_expecting(
        &mut self,
        expected: &'static str,
    ) -> Result<&'a str, DecodeError> {
        let len = self.decode_header(MajorType::TextString, expected)?;
        if len > self.remaining() as u64 {
            return Err(DecodeError::LengthOutOfRange { expected, len });
        }
        let bytes = self.take(len as usize, expected)?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Decode an array header (major type 4), returning the element count.
    pub fn decode_array_header(&mut self) -> Result<u64, DecodeError> {
        self.decode_array_header_expecting("array")
    }

    pub fn decode_array_header_expecting(
        &mut self,
        expected: &'static str,
    ) -> Result<u64, DecodeError> {
        self.decode_header(MajorType::Array, expected)
    }

    /// Decode a map header (major type 5), returning the entry count.
    pub fn decode_map_header(&mut self) -> Result<u64, DecodeError> {
        self.decode_map_header_expecting("map")
    }

    pub fn decode_map_header_expecting(
        &mut self,
        expected: &'static str,
    ) -> Result<u64, DecodeError> {
        self.decode_header(MajorType::Map, expected)
    }
}
