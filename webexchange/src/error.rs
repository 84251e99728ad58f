// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Errors surfaced while constructing or signing an exchange.
#[derive(Debug, Error)]
pub enum SignedExchangeError {
    #[error("unsupported RSA key size: {bits} bits")]
    UnsupportedKeySize { bits: usize },

    #[error("unknown ECDSA curve: {oid}")]
    UnknownCurve { oid: String },

    #[error("unknown private key type")]
    UnsupportedKey,

    #[error("response status {0} is outside 100..=999")]
    InvalidStatus(u16),

    #[error("payload is already mi-sha256 encoded")]
    AlreadyPrepared,

    #[error("MICE record size must be at least 1")]
    InvalidRecordSize,

    #[error("signing failed: {0}")]
    Signing(#[from] signature::Error),

    #[error(transparent)]
    Cbor(#[from] webexchange_cbor::EncodeError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a CERTIFICATE PEM block: {0}")]
    UnexpectedPemBlock(String),

    #[error("malformed PEM input: {0}")]
    Pem(String),

    #[error("malformed DER certificate: {0}")]
    MalformedCertificate(String),
}
