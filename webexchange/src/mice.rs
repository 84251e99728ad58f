// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Merkle Integrity Content Encoding over SHA-256 (`mi-sha256`).
//!
//! The payload is split into records of a fixed size; each record is bound
//! to the hash chain of everything after it:
//!
//! ```text
//! proof[n-1] = SHA-256(record[n-1])
//! proof[i]   = SHA-256(record[i] || proof[i+1] || 0x00)
//! ```
//!
//! `proof[0]` is the top-level digest carried in the `MI` response header.
//! The encoded body interleaves records with the proof of their successor:
//! an 8-byte big-endian record size, then
//! `record[0] || proof[1] || record[1] || ... || record[n-1]`.

use std::io::Write;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest as _, Sha256};

use crate::SignedExchangeError;

/// The `Content-Encoding` token for this encoding.
pub const CONTENT_ENCODING: &str = "mi-sha256";

/// MICE-encode `payload` into `w` and return the `MI` header value
/// (`mi-sha256=<base64url digest, no padding>`).
///
/// An empty payload encodes to the bare record-size prefix and digests to
/// `SHA-256("")`.
pub fn encode<W: Write>(
    w: &mut W,
    payload: &[u8],
    record_size: usize,
) -> Result<String, SignedExchangeError> {
    if record_size == 0 {
        return Err(SignedExchangeError::InvalidRecordSize);
    }

    let records: Vec<&[u8]> = payload.chunks(record_size).collect();

    let mut proofs: Vec<[u8; 32]> = vec![[0u8; 32]; records.len()];
    if let Some(last) = records.last() {
        proofs[records.len() - 1] = Sha256::digest(last).into();
        for i in (0..records.len() - 1).rev() {
            let mut h = Sha256::new();
            h.update(records[i]);
            h.update(proofs[i + 1]);
            h.update([0u8]);
            proofs[i] = h.finalize().into();
        }
    }

    let digest: [u8; 32] = match proofs.first() {
        Some(p) => *p,
        None => Sha256::digest([]).into(),
    };

    w.write_all(&(record_size as u64).to_be_bytes())?;
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            w.write_all(&proofs[i])?;
        }
        w.write_all(record)?;
    }

    Ok(format!("mi-sha256={}", URL_SAFE_NO_PAD.encode(digest)))
}
