// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Exchange signing: preimage assembly and the `Signature` header.
//!
//! The signed message matches the TLS 1.3 signing format to prevent
//! cross-protocol attacks when TLS certificates sign exchanges: 64 bytes of
//! 0x20 padding, an ASCII context string, a zero separator, then the
//! canonical CBOR map binding the certificate hash, validity window and the
//! canonical exchange headers.

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use rand_core::CryptoRngCore;
use sha2::{Digest as _, Sha256};
use url::Url;
use webexchange_cbor::{Encoder, MapEntry};

use crate::algorithms::{signing_algorithm_for_private_key, PrivateKey};
use crate::certs::Certificate;
use crate::{Input, SignedExchangeError};

/// 64 bytes of 0x20 padding that open the signed message.
const SIGNED_MESSAGE_PADDING: [u8; 64] = [0x20; 64];

/// Context string separating the padding from the signed fields.
const SIGNED_MESSAGE_CONTEXT: &[u8] = b"HTTP Exchange";

/// Produces `Signature` header values for exchanges.
///
/// Everything reachable from a signer is read-only after construction
/// except the RNG, which each signing call borrows.
pub struct Signer<R> {
    pub date: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    /// Certificate chain; `certs[0]` is hashed into `certSha256`.
    pub certs: Vec<Certificate>,
    /// Where the certificate chain is hosted (`certUrl=` parameter).
    pub cert_url: Url,
    /// Where signature validity updates are hosted, when supplied.
    pub validity_url: Option<Url>,
    pub priv_key: PrivateKey,
    pub rng: R,
}

impl<R: CryptoRngCore> Signer<R> {
    fn cert_sha256(&self) -> Option<[u8; 32]> {
        self.certs.first().map(|c| Sha256::digest(c.raw_der()).into())
    }

    /// Assemble the byte string the signature is computed over.
    fn serialize_signed_message(&self, input: &Input) -> Result<Vec<u8>, SignedExchangeError> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SIGNED_MESSAGE_PADDING);
        buf.extend_from_slice(SIGNED_MESSAGE_CONTEXT);
        buf.push(0);

        let mut entries = Vec::new();
        if let Some(hash) = self.cert_sha256() {
            entries.push(MapEntry::encoded(|k, v| {
                k.encode_text_string("certSha256")?;
                v.encode_byte_string(&hash)
            })?);
        }
        entries.push(MapEntry::encoded(|k, v| {
            k.encode_text_string("date")?;
            v.encode_int(self.date.timestamp())
        })?);
        entries.push(MapEntry::encoded(|k, v| {
            k.encode_text_string("expires")?;
            v.encode_int(self.expires.timestamp())
        })?);

        let mut key = Encoder::new(Vec::new());
        key.encode_text_string("headers")?;
        let mut value = Encoder::new(Vec::new());
        input.encode_canonical_exchange_headers(&mut value)?;
        entries.push(MapEntry::new(key.into_writer(), value.into_writer()));

        let mut e = Encoder::new(&mut buf);
        e.encode_map(entries)?;
        Ok(buf)
    }

    fn sign(&mut self, input: &Input) -> Result<Vec<u8>, SignedExchangeError> {
        let alg = signing_algorithm_for_private_key(&self.priv_key)?;
        let message = self.serialize_signed_message(input)?;
        alg.sign(&mut self.rng, &message)
    }

    /// Sign the exchange and format the `Signature` response-header value.
    ///
    /// Binary parameters use the structured-header form `*<base64>` with no
    /// padding; the field order is fixed.
    pub fn signature_header_value(&mut self, input: &Input) -> Result<String, SignedExchangeError> {
        let sig = self.sign(input)?;

        let mut out = format!("sig=*{}", STANDARD_NO_PAD.encode(&sig));
        if let Some(validity_url) = &self.validity_url {
            let _ = write!(out, "; validityUrl=\"{validity_url}\"");
        }
        let cert_sha256 = self
            .cert_sha256()
            .map(|hash| STANDARD_NO_PAD.encode(hash))
            .unwrap_or_default();
        let _ = write!(
            out,
            "; integrity=\"mi\"; certUrl=\"{}\"; certSha256=*{}; date={}; expires={}",
            self.cert_url,
            cert_sha256,
            self.date.timestamp(),
            self.expires.timestamp(),
        );
        Ok(out)
    }
}
