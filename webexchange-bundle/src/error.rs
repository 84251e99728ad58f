// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Errors surfaced while writing or reading bundles.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("header magic mismatch")]
    MagicMismatch,

    #[error("duplicated section in section-offsets map: {name:?}")]
    DuplicateSection { name: String },

    #[error("section {name:?} range {offset}+{length} is out of range")]
    OffsetOutOfRange {
        name: String,
        offset: u64,
        length: u64,
    },

    #[error("bundle has no {name:?} section")]
    MissingSection { name: String },

    #[error("duplicated request key in index section")]
    DuplicateIndexEntry,

    #[error("section offset value is not a 2-element array, got {0} elements")]
    MalformedSectionEntry(u64),

    #[error("index entry range is not a 2-element array, got {0} elements")]
    MalformedIndexEntry(u64),

    #[error("response entry is not a 2-element array, got {0} elements")]
    MalformedResponseEntry(u64),

    #[error(transparent)]
    Decode(#[from] webexchange_cbor::DecodeError),

    #[error(transparent)]
    Encode(#[from] webexchange_cbor::EncodeError),

    #[error(transparent)]
    Exchange(#[from] webexchange::SignedExchangeError),

    #[error("failed to write bundle: {0}")]
    Io(#[from] std::io::Error),
}
