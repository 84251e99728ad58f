// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signed HTTP exchanges.
//!
//! This crate builds `.htxg` signed-exchange files per the origin-signed
//! responses draft:
//! - [`Input`] holds one request/response pair; construction runs Merkle
//!   Integrity Content Encoding ([`mice`]) over the payload.
//! - [`Signer`] assembles the TLS-style signed message and produces the
//!   `Signature` response-header value.
//! - [`write_exchange_file`] emits the 7-element top-level CBOR array.
//!
//! Cryptographic primitives, PEM/X.509 parsing and I/O are collaborators:
//! the RustCrypto signing crates behind [`algorithms`], `x509-parser`
//! behind [`certs`], and caller-provided byte sinks everywhere else.

pub mod algorithms;
pub mod certs;
mod error;
mod input;
pub mod keys;
pub mod mice;
mod signer;

pub use algorithms::{signing_algorithm_for_private_key, PrivateKey, SigningAlgorithm};
pub use certs::{parse_certificates, Certificate};
pub use error::SignedExchangeError;
pub use input::{
    canonical_request_entries, joined_headers, status_entry, write_exchange_file, Input,
    ResponseHeader,
};
pub use keys::{parse_private_key, parse_private_key_pem};
pub use signer::Signer;
