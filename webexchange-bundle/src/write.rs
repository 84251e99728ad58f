// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bundle writing.
//!
//! Exchanges are staged into two in-memory sections first: the responses
//! section accumulates `[response-headers, payload]` pairs and reports each
//! pair's `(offset, length)`, which the index section records under the
//! exchange's canonical request key. Section offsets are computed after
//! staging, then the framing is streamed out around the section bytes.

use std::io::Write;

use webexchange_cbor::{Encoder, MapEntry};

use crate::{BundleError, Exchange, HEADER_MAGIC, SECTION_INDEX, SECTION_RESPONSES};

/// An ordered sequence of exchanges. Requests are not deduplicated.
#[derive(Default)]
pub struct Bundle {
    pub exchanges: Vec<Exchange>,
}

/// Location of one section relative to `sections_start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOffset {
    pub name: String,
    pub offset: u64,
    pub length: u64,
}

#[derive(Default)]
struct SectionOffsets(Vec<SectionOffset>);

impl SectionOffsets {
    /// Append a section; its offset is where the previous section ends.
    fn add_section_ordered(&mut self, name: &str, length: u64) {
        let offset = self
            .0
            .last()
            .map(|last| last.offset + last.length)
            .unwrap_or(0);
        self.0.push(SectionOffset {
            name: name.to_string(),
            offset,
            length,
        });
    }
}

/// Staging area for the index section.
#[derive(Default)]
struct IndexSection {
    entries: Vec<MapEntry>,
    bytes: Option<Vec<u8>>,
}

impl IndexSection {
    fn add_exchange(
        &mut self,
        exchange: &Exchange,
        offset: u64,
        length: u64,
    ) -> Result<(), BundleError> {
        let key = exchange.request_key()?;
        let mut value = Encoder::new(Vec::new());
        value.encode_array_header(2)?;
        value.encode_uint(offset)?;
        value.encode_uint(length)?;
        self.entries.push(MapEntry::new(key, value.into_writer()));
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), BundleError> {
        if self.bytes.is_some() {
            panic!("IndexSection must be finalized only once");
        }
        let mut e = Encoder::new(Vec::new());
        e.encode_map(std::mem::take(&mut self.entries))?;
        self.bytes = Some(e.into_writer());
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        self.bytes
            .as_deref()
            .expect("IndexSection must be finalized before use")
    }
}

/// Staging area for the responses section.
struct ResponsesSection {
    buf: Vec<u8>,
}

impl ResponsesSection {
    fn new(exchange_count: u64) -> Result<Self, BundleError> {
        let mut e = Encoder::new(Vec::new());
        e.encode_array_header(exchange_count)?;
        Ok(Self {
            buf: e.into_writer(),
        })
    }

    /// Append one `[response-headers, payload]` pair, returning its byte
    /// range within the section.
    fn add_exchange(&mut self, exchange: &Exchange) -> Result<(u64, u64), BundleError> {
        let offset = self.buf.len() as u64;

        let mut headers = Vec::new();
        exchange.write_response_headers(&mut headers)?;

        let mut e = Encoder::new(&mut self.buf);
        e.encode_array_header(2)?;
        e.encode_byte_string(&headers)?;
        e.encode_byte_string(exchange.payload())?;

        Ok((offset, self.buf.len() as u64 - offset))
    }
}

/// A writer that tracks how many bytes have passed through it, so the
/// footer can declare the total file size.
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn write_section_offsets<W: Write>(w: &mut W, offsets: &SectionOffsets) -> Result<(), BundleError> {
    let mut entries = Vec::with_capacity(offsets.0.len());
    for section in &offsets.0 {
        entries.push(MapEntry::encoded(|k, v| {
            k.encode_text_string(&section.name)?;
            v.encode_array_header(2)?;
            v.encode_uint(section.offset)?;
            v.encode_uint(section.length)
        })?);
    }

    let mut nested = Encoder::new(Vec::new());
    nested.encode_map(entries)?;

    let mut e = Encoder::new(w);
    e.encode_byte_string(&nested.into_writer())?;
    Ok(())
}

/// The footer is a CBOR byte string holding the total bundle size as an
/// 8-byte big-endian integer; the declared size includes the footer's own
/// 9 bytes.
fn write_footer<W: Write>(w: &mut W, offset: u64) -> Result<(), BundleError> {
    const FOOTER_LENGTH: u64 = 9;

    let bundle_size = offset + FOOTER_LENGTH;
    let mut e = Encoder::new(w);
    e.encode_byte_string(&bundle_size.to_be_bytes())?;
    Ok(())
}

impl Bundle {
    pub fn new(exchanges: Vec<Exchange>) -> Self {
        Self { exchanges }
    }

    /// Write the bundle file, returning the total number of bytes written.
    pub fn write_to<W: Write>(&self, w: W) -> Result<u64, BundleError> {
        let mut cw = CountingWriter::new(w);

        let mut index = IndexSection::default();
        let mut responses = ResponsesSection::new(self.exchanges.len() as u64)?;

        for exchange in &self.exchanges {
            let (offset, length) = responses.add_exchange(exchange)?;
            index.add_exchange(exchange, offset, length)?;
        }
        index.finalize()?;

        let mut offsets = SectionOffsets::default();
        offsets.add_section_ordered(SECTION_INDEX, index.bytes().len() as u64);
        offsets.add_section_ordered(SECTION_RESPONSES, responses.buf.len() as u64);

        cw.write_all(&HEADER_MAGIC)?;
        write_section_offsets(&mut cw, &offsets)?;

        // The section-count array header; section contents follow as raw
        // bytes addressed through the offsets, not as distinct CBOR items.
        Encoder::new(&mut cw).encode_array_header(offsets.0.len() as u64)?;

        cw.write_all(index.bytes())?;
        cw.write_all(&responses.buf)?;

        let written = cw.written;
        write_footer(&mut cw, written)?;

        Ok(cw.written)
    }
}
