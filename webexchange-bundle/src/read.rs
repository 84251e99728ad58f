// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bundle metadata loading.
//!
//! The reader is stateless and works over an in-memory byte slice. It
//! parses the framing (magic, section-offsets, per-section offsets) and the
//! index section; response bodies are decoded on demand through
//! [`read_response`], which borrows the payload from the input buffer
//! rather than copying it.

use webexchange_cbor::Decoder;

use crate::{BundleError, SectionOffset, HEADER_MAGIC, SECTION_INDEX, SECTION_RESPONSES};

/// One index entry: a canonical request key and the byte range of its
/// response inside the responses section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub request_key: Vec<u8>,
    pub offset: u64,
    pub length: u64,
}

/// Parsed bundle metadata: the section table and the decoded index.
#[derive(Debug)]
pub struct BundleMetadata {
    pub section_offsets: Vec<SectionOffset>,
    /// Absolute offset where section contents begin.
    pub sections_start: u64,
    pub index: Vec<IndexEntry>,
}

impl BundleMetadata {
    pub fn find_section(&self, name: &str) -> Option<&SectionOffset> {
        self.section_offsets.iter().find(|s| s.name == name)
    }

    /// Look up the index entry for a canonical request key.
    pub fn find_response(&self, request_key: &[u8]) -> Option<&IndexEntry> {
        self.index.iter().find(|e| e.request_key == request_key)
    }
}

/// One response materialized from the responses section.
#[derive(Debug, PartialEq, Eq)]
pub struct ResponseView<'a> {
    /// Decoded response-header map entries (name, value), in map order.
    pub headers: Vec<(Vec<u8>, Vec<u8>)>,
    /// Payload bytes, borrowed from the bundle buffer.
    pub payload: &'a [u8],
}

/// Parse a bundle's framing and index from an in-memory file image.
pub fn load_metadata(bytes: &[u8]) -> Result<BundleMetadata, BundleError> {
    if bytes.len() < HEADER_MAGIC.len() || bytes[..HEADER_MAGIC.len()] != HEADER_MAGIC {
        return Err(BundleError::MagicMismatch);
    }

    let mut dec = Decoder::new(&bytes[HEADER_MAGIC.len()..]);
    let offsets_bytes = dec.decode_byte_string_expecting("section-offsets byte string")?;
    let section_offsets = decode_section_offsets(offsets_bytes)?;

    // Section contents begin after the section-count array header; the
    // recorded offsets are relative to that point.
    dec.decode_array_header_expecting("section-count array")?;
    let sections_start = (HEADER_MAGIC.len() + dec.position()) as u64;

    let mut index = Vec::new();
    for section in &section_offsets {
        // Only sections whose specification carries metadata are parsed;
        // unknown sections are skipped, and `responses` is Metadata: No.
        if section.name != SECTION_INDEX {
            continue;
        }
        let out_of_range = || BundleError::OffsetOutOfRange {
            name: section.name.clone(),
            offset: section.offset,
            length: section.length,
        };
        let start = sections_start
            .checked_add(section.offset)
            .ok_or_else(out_of_range)?;
        let end = start.checked_add(section.length).ok_or_else(out_of_range)?;
        if end > bytes.len() as u64 {
            return Err(out_of_range());
        }
        index = parse_index_section(&bytes[start as usize..end as usize])?;
    }

    let metadata = BundleMetadata {
        section_offsets,
        sections_start,
        index,
    };
    tracing::debug!(
        sections = metadata.section_offsets.len(),
        index_entries = metadata.index.len(),
        sections_start = metadata.sections_start,
        "loaded bundle metadata"
    );
    Ok(metadata)
}

/// Decode the `{ section-name => [offset, length] }` map.
fn decode_section_offsets(bytes: &[u8]) -> Result<Vec<SectionOffset>, BundleError> {
    let mut dec = Decoder::new(bytes);
    let n = dec.decode_map_header_expecting("section-offsets map")?;

    let mut offsets: Vec<SectionOffset> = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let name = dec.decode_text_string_expecting("section name")?;
        if offsets.iter().any(|s| s.name == name) {
            return Err(BundleError::DuplicateSection {
                name: name.to_string(),
            });
        }

        let len = dec.decode_array_header_expecting("section offset array")?;
        if len != 2 {
            return Err(BundleError::MalformedSectionEntry(len));
        }
        let offset = dec.decode_uint_expecting("section offset")?;
        let length = dec.decode_uint_expecting("section length")?;
        offsets.push(SectionOffset {
            name: name.to_string(),
            offset,
            length,
        });
    }

    Ok(offsets)
}

/// Decode the index section: a map from request-key bytes to `[offset,
/// length]` ranges inside the responses section.
fn parse_index_section(bytes: &[u8]) -> Result<Vec<IndexEntry>, BundleError> {
    let mut dec = Decoder::new(bytes);
    let n = dec.decode_map_header_expecting("index map")?;

    let mut entries: Vec<IndexEntry> = Vec::with_capacity(n as usize);
    for _ in 0..n {
        // The request key is itself an encoded CBOR map; capture its raw
        // bytes by walking one map item and slicing around it.
        let key_start = dec.position();
        skip_request_map(&mut dec)?;
        let request_key = bytes[key_start..dec.position()].to_vec();
        if entries.iter().any(|e| e.request_key == request_key) {
            return Err(BundleError::DuplicateIndexEntry);
        }

        let len = dec.decode_array_header_expecting("index entry range")?;
        if len != 2 {
            return Err(BundleError::MalformedIndexEntry(len));
        }
        let offset = dec.decode_uint_expecting("index entry offset")?;
        let length = dec.decode_uint_expecting("index entry length")?;
        entries.push(IndexEntry {
            request_key,
            offset,
            length,
        });
    }

    Ok(entries)
}

/// Walk one canonical request map (byte-string keys and values).
fn skip_request_map(dec: &mut Decoder<'_>) -> Result<(), BundleError> {
    let n = dec.decode_map_header_expecting("request map")?;
    for _ in 0..n {
        dec.decode_byte_string_expecting("request map key")?;
        dec.decode_byte_string_expecting("request map value")?;
    }
    Ok(())
}

/// Decode the response referenced by an index entry.
///
/// `bytes` must be the same buffer `metadata` was loaded from. The payload
/// is returned as a borrowed slice of that buffer.
pub fn read_response<'a>(
    bytes: &'a [u8],
    metadata: &BundleMetadata,
    entry: &IndexEntry,
) -> Result<ResponseView<'a>, BundleError> {
    let responses = metadata
        .find_section(SECTION_RESPONSES)
        .ok_or_else(|| BundleError::MissingSection {
            name: SECTION_RESPONSES.to_string(),
        })?;

    let out_of_range = || BundleError::OffsetOutOfRange {
        name: SECTION_RESPONSES.to_string(),
        offset: entry.offset,
        length: entry.length,
    };
    let start = metadata
        .sections_start
        .checked_add(responses.offset)
        .and_then(|n| n.checked_add(entry.offset))
        .ok_or_else(out_of_range)?;
    let end = start.checked_add(entry.length).ok_or_else(out_of_range)?;
    if end > bytes.len() as u64 {
        return Err(out_of_range());
    }

    let mut dec = Decoder::new(&bytes[start as usize..end as usize]);
    let len = dec.decode_array_header_expecting("response entry")?;
    if len != 2 {
        return Err(BundleError::MalformedResponseEntry(len));
    }

    let header_bytes = dec.decode_byte_string_expecting("response headers byte string")?;
    let payload = dec.decode_byte_string_expecting("response payload byte string")?;

    let mut headers = Vec::new();
    let mut hdec = Decoder::new(header_bytes);
    let n = hdec.decode_map_header_expecting("response header map")?;
    for _ in 0..n {
        let name = hdec.decode_byte_string_expecting("response header name")?;
        let value = hdec.decode_byte_string_expecting("response header value")?;
        headers.push((name.to_vec(), value.to_vec()));
    }

    Ok(ResponseView { headers, payload })
}
