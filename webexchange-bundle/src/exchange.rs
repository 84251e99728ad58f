// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bundle-level exchanges.
//!
//! Unlike a signed exchange's [`webexchange::Input`], a bundle exchange
//! carries request headers and an untransformed payload; bundles do not run
//! content encodings over their members.

use std::io::Write;

use url::Url;
use webexchange::ResponseHeader;
use webexchange_cbor::{Encoder, MapEntry};

use crate::BundleError;

/// One request/response pair stored in a bundle.
pub struct Exchange {
    pub request_url: Url,
    pub request_headers: Vec<ResponseHeader>,
    pub response_status: u16,
    pub response_headers: Vec<ResponseHeader>,
    payload: Vec<u8>,
}

impl Exchange {
    pub fn new(
        request_url: Url,
        request_headers: Vec<ResponseHeader>,
        response_status: u16,
        response_headers: Vec<ResponseHeader>,
        payload: Vec<u8>,
    ) -> Result<Self, BundleError> {
        if !(100..=999).contains(&response_status) {
            return Err(webexchange::SignedExchangeError::InvalidStatus(response_status).into());
        }
        Ok(Self {
            request_url,
            request_headers,
            response_status,
            response_headers,
            payload,
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Encode the canonical request map including request headers:
    /// `:method`/`:url` plus each request header under its lowercase name.
    pub fn encode_request_with_headers<W: Write>(
        &self,
        e: &mut Encoder<W>,
    ) -> Result<(), BundleError> {
        let mut entries = webexchange::canonical_request_entries(&self.request_url)?;
        for (name, value) in webexchange::joined_headers(&self.request_headers) {
            entries.push(MapEntry::encoded(|k, v| {
                k.encode_byte_string(name.as_bytes())?;
                v.encode_byte_string(value.as_bytes())
            })?);
        }
        e.encode_map(entries)?;
        Ok(())
    }

    /// The canonical request map bytes, used as this exchange's index key.
    pub fn request_key(&self) -> Result<Vec<u8>, BundleError> {
        let mut e = Encoder::new(Vec::new());
        self.encode_request_with_headers(&mut e)?;
        Ok(e.into_writer())
    }

    /// Write the canonical response-header map (unfiltered).
    pub fn write_response_headers<W: Write>(&self, w: &mut W) -> Result<(), BundleError> {
        let mut entries = vec![webexchange::status_entry(self.response_status)?];
        for (name, value) in webexchange::joined_headers(&self.response_headers) {
            entries.push(MapEntry::encoded(|k, v| {
                k.encode_byte_string(name.as_bytes())?;
                v.encode_byte_string(value.as_bytes())
            })?);
        }
        let mut e = Encoder::new(w);
        e.encode_map(entries)?;
        Ok(())
    }
}
