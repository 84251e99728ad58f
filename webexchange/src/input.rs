// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Exchange inputs, canonical header encoding and the `.htxg` writer.
//!
//! An [`Input`] is one request/response pair. Constructing it runs the
//! `mi-sha256` content encoding over the payload exactly once; afterwards
//! the record is treated as immutable by the signing and writing passes.
//!
//! Canonical encoding notes (draft §3.4):
//! - Request maps carry byte-string keys `:method` and `:url`.
//! - Response maps start with `:status` and lowercase every header name.
//! - Map ordering is handled entirely by the CBOR layer, so headers can be
//!   staged in whatever order the caller supplied them.

use std::io::Write;

use url::Url;
use webexchange_cbor::{Encoder, MapEntry};

use crate::{mice, SignedExchangeError};

/// An ordered response header. The name keeps the caller's spelling;
/// comparisons and canonical encoding lowercase it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    pub name: String,
    pub value: String,
}

impl ResponseHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One exchange: request URI, response status/headers and the MICE-encoded
/// payload.
#[derive(Debug)]
pub struct Input {
    pub request_uri: Url,
    pub response_status: u16,
    pub response_headers: Vec<ResponseHeader>,
    payload: Vec<u8>,
}

impl Input {
    /// Build an exchange input. The raw payload is MICE-encoded with the
    /// given record size, and `Content-Encoding: mi-sha256` plus the `MI`
    /// digest header are appended to the response headers.
    pub fn new(
        request_uri: Url,
        response_status: u16,
        response_headers: Vec<ResponseHeader>,
        payload: Vec<u8>,
        mi_record_size: usize,
    ) -> Result<Self, SignedExchangeError> {
        if !(100..=999).contains(&response_status) {
            return Err(SignedExchangeError::InvalidStatus(response_status));
        }
        let mut input = Self {
            request_uri,
            response_status,
            response_headers,
            payload,
        };
        input.mi_encode(mi_record_size)?;
        Ok(input)
    }

    fn mi_encode(&mut self, record_size: usize) -> Result<(), SignedExchangeError> {
        if self.header_value("mi").is_some() {
            return Err(SignedExchangeError::AlreadyPrepared);
        }
        let mut encoded = Vec::new();
        let mi = mice::encode(&mut encoded, &self.payload, record_size)?;
        self.payload = encoded;
        self.response_headers
            .push(ResponseHeader::new("Content-Encoding", mice::CONTENT_ENCODING));
        self.response_headers.push(ResponseHeader::new("MI", mi));
        Ok(())
    }

    /// The MICE-encoded payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// First response header whose name matches case-insensitively.
    fn header_value(&self, lower_name: &str) -> Option<&str> {
        self.response_headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(lower_name))
            .map(|h| h.value.as_str())
    }

    /// Add the `signed-headers` response header naming which response
    /// headers participate in the signature.
    ///
    /// The value is a structured-header list of quoted lowercase names.
    /// Pseudo-header names (leading `:`) must not appear and are skipped.
    pub fn add_signed_headers_header(&mut self, names: &[&str]) {
        let quoted: Vec<String> = names
            .iter()
            .filter(|n| !n.starts_with(':'))
            .map(|n| format!("\"{}\"", n.to_ascii_lowercase()))
            .collect();
        self.response_headers
            .push(ResponseHeader::new("signed-headers", quoted.join(", ")));
    }

    /// Parse the `signed-headers` list back into names.
    ///
    /// Parsing is permissive: tokens are split on commas, surrounding
    /// whitespace is trimmed, and one layer of surrounding quotes is
    /// stripped. Embedded whitespace is left alone.
    fn parse_signed_headers_header(&self) -> Vec<String> {
        let unparsed = self.header_value("signed-headers").unwrap_or_default();
        unparsed
            .split(',')
            .map(|token| {
                let token = token.trim();
                let token = token.strip_prefix('"').unwrap_or(token);
                let token = token.strip_suffix('"').unwrap_or(token);
                token.to_string()
            })
            .collect()
    }

    /// Encode the canonical request map: `:method` → `GET`, `:url` → the
    /// serialized request URI. Exchanges carry no request payload, so only
    /// GET is representable.
    pub fn encode_canonical_request<W: Write>(
        &self,
        e: &mut Encoder<W>,
    ) -> Result<(), SignedExchangeError> {
        e.encode_map(canonical_request_entries(&self.request_uri)?)?;
        Ok(())
    }

    /// Encode the response-header map: `:status` followed by every header
    /// accepted by `filter` (called with the lowercased name). Headers that
    /// repeat under the same lowercase name are comma-joined into one entry.
    pub fn encode_response_headers<W: Write, F>(
        &self,
        e: &mut Encoder<W>,
        filter: F,
    ) -> Result<(), SignedExchangeError>
    where
        F: Fn(&str) -> bool,
    {
        let mut entries = vec![status_entry(self.response_status)?];
        for (name, value) in joined_headers(&self.response_headers) {
            if !filter(&name) {
                continue;
            }
            entries.push(MapEntry::encoded(|k, v| {
                k.encode_byte_string(name.as_bytes())?;
                v.encode_byte_string(value.as_bytes())
            })?);
        }
        e.encode_map(entries)?;
        Ok(())
    }

    /// Encode the 2-element `[request-map, response-map]` array, with the
    /// response map filtered to the `signed-headers` names.
    pub fn encode_canonical_exchange_headers<W: Write>(
        &self,
        e: &mut Encoder<W>,
    ) -> Result<(), SignedExchangeError> {
        e.encode_array_header(2)?;
        self.encode_canonical_request(e)?;

        let signed = self.parse_signed_headers_header();
        self.encode_response_headers(e, |name| signed.iter().any(|s| s == name))
    }
}

pub fn canonical_request_entries(
    request_uri: &Url,
) -> Result<Vec<MapEntry>, SignedExchangeError> {
    Ok(vec![
        MapEntry::encoded(|k, v| {
            k.encode_byte_string(b":method")?;
            v.encode_byte_string(b"GET")
        })?,
        MapEntry::encoded(|k, v| {
            k.encode_byte_string(b":url")?;
            v.encode_byte_string(request_uri.as_str().as_bytes())
        })?,
    ])
}

pub fn status_entry(status: u16) -> Result<MapEntry, SignedExchangeError> {
    MapEntry::encoded(|k, v| {
        k.encode_byte_string(b":status")?;
        v.encode_byte_string(status.to_string().as_bytes())
    })
    .map_err(Into::into)
}

/// Collapse ordered headers into `(lowercase name, value)` pairs, joining
/// repeated names with `", "`.
pub fn joined_headers(headers: &[ResponseHeader]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::with_capacity(headers.len());
    for h in headers {
        let name = h.name.to_ascii_lowercase();
        match out.iter_mut().find(|(n, _)| *n == name) {
            Some((_, value)) => {
                value.push_str(", ");
                value.push_str(&h.value);
            }
            None => out.push((name, h.value.clone())),
        }
    }
    out
}

/// Write the `.htxg` exchange file: a 7-element top-level CBOR array of the
/// `"htxg"` identifier and labelled request map, response map (unfiltered)
/// and MICE-encoded payload.
pub fn write_exchange_file<W: Write>(w: &mut W, input: &Input) -> Result<(), SignedExchangeError> {
    let mut e = Encoder::new(w);
    e.encode_array_header(7)?;
    e.encode_text_string("htxg")?;

    e.encode_text_string("request")?;
    input.encode_canonical_request(&mut e)?;

    // Request payload slot is reserved by the draft and not emitted.

    e.encode_text_string("response")?;
    input.encode_response_headers(&mut e, |_| true)?;

    e.encode_text_string("payload")?;
    e.encode_byte_string(input.payload())?;

    // Trailer slot is likewise not emitted.

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with_headers() -> Input {
        Input::new(
            Url::parse("https://example.com/").unwrap(),
            200,
            vec![ResponseHeader::new("Content-Type", "text/html")],
            b"hello".to_vec(),
            4096,
        )
        .unwrap()
    }

    #[test]
    fn new_appends_mice_headers_once() {
        let input = input_with_headers();
        let names: Vec<String> = input
            .response_headers
            .iter()
            .map(|h| h.name.to_ascii_lowercase())
            .collect();
        assert_eq!(names, ["content-type", "content-encoding", "mi"]);
        assert_eq!(input.header_value("content-encoding"), Some("mi-sha256"));
        assert!(input.header_value("mi").unwrap().starts_with("mi-sha256="));
    }

    #[test]
    fn invalid_status_is_rejected() {
        let err = Input::new(
            Url::parse("https://example.com/").unwrap(),
            99,
            Vec::new(),
            Vec::new(),
            4096,
        )
        .unwrap_err();
        assert!(matches!(err, SignedExchangeError::InvalidStatus(99)));
    }

    #[test]
    fn signed_headers_emitter_lowercases_and_quotes() {
        let mut input = input_with_headers();
        input.add_signed_headers_header(&["Content-Type", ":status", "MI"]);
        assert_eq!(
            input.header_value("signed-headers"),
            Some("\"content-type\", \"mi\"")
        );
    }

    #[test]
    fn signed_headers_parser_is_whitespace_tolerant() {
        let mut input = input_with_headers();
        input
            .response_headers
            .push(ResponseHeader::new("signed-headers", "\"a\" ,  \"b\",c"));
        assert_eq!(input.parse_signed_headers_header(), ["a", "b", "c"]);
    }

    #[test]
    fn repeated_headers_are_comma_joined() {
        let headers = vec![
            ResponseHeader::new("Set-Thing", "a"),
            ResponseHeader::new("set-thing", "b"),
        ];
        assert_eq!(
            joined_headers(&headers),
            [("set-thing".to_string(), "a, b".to_string())]
        );
    }
}
