// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Canonical CBOR for signed exchanges and web bundles.
//!
//! Both file formats serialize to Canonical CBOR (RFC 7049 §3.9) and must be
//! reproducible bit-exact, so this crate implements exactly the subset the
//! drafts use and nothing more:
//! - Unsigned/negative integers with shortest-form length encoding.
//! - Definite-length byte strings and text strings.
//! - Definite-length arrays.
//! - Maps whose entries are emitted in canonical order (byte-wise comparison
//!   of the fully encoded keys).
//!
//! The decoder is deliberately strict: it rejects non-minimal integer
//! encodings and anything outside the subset above, and every failure names
//! what was expected.

pub mod decode;
pub mod encode;

pub use decode::{DecodeError, Decoder};
pub use encode::{EncodeError, Encoder, MapEntry};

/// CBOR major types used by this codec.
///
/// The raw value is the three-bit major type from the item's initial byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum MajorType {
    UnsignedInt = 0,
    NegativeInt = 1,
    ByteString = 2,
    TextString = 3,
    Array = 4,
    Map = 5,
}

impl MajorType {
    pub(crate) fn from_initial_byte(b: u8) -> Option<Self> {
        match b >> 5 {
            0 => Some(MajorType::UnsignedInt),
            1 => Some(MajorType::NegativeInt),
            2 => Some(MajorType::ByteString),
            3 => Some(MajorType::TextString),
            4 => Some(MajorType::Array),
            5 => Some(MajorType::Map),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            MajorType::UnsignedInt => "unsigned integer",
            MajorType::NegativeInt => "negative integer",
            MajorType::ByteString => "byte string",
            MajorType::TextString => "text string",
            MajorType::Array => "array",
            MajorType::Map => "map",
        }
    }
}
