// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Web bundles: a CBOR container of multiple HTTP exchanges.
//!
//! A bundle file is laid out as
//! `magic ‖ section-offsets ‖ section-count ‖ index ‖ responses ‖ footer`:
//! the index section maps canonical request keys to `[offset, length]`
//! ranges inside the responses section, and the 9-byte footer declares the
//! total file size.
//!
//! [`Bundle::write_to`] produces the file; [`load_metadata`] parses the
//! framing and index of an in-memory bundle without materializing the
//! exchanges, and [`read_response`] decodes one response on demand.

mod error;
mod exchange;
mod read;
mod write;

pub use error::BundleError;
pub use exchange::Exchange;
pub use read::{load_metadata, read_response, BundleMetadata, IndexEntry, ResponseView};
pub use write::{Bundle, SectionOffset};

/// The fixed 10-byte bundle header: the CBOR openers for a 4-element array
/// and an 8-byte byte string, followed by "🌐📦" in UTF-8.
pub const HEADER_MAGIC: [u8; 10] = [0x84, 0x48, 0xf0, 0x9f, 0x8c, 0x90, 0xf0, 0x9f, 0x93, 0xa6];

/// Name of the index section.
pub const SECTION_INDEX: &str = "index";

/// Name of the responses section.
pub const SECTION_RESPONSES: &str = "responses";
