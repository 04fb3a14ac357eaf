// Copyright (c) 2026 The image-sign Authors
//
// SPDX-License-Identifier: Apache-2.0
//

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure is terminal for the current sign operation. Nothing is
/// retried here; retries belong to the registry transport.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid digest format: {0:?}, expected `algorithm:hex`")]
    InvalidDigestFormat(String),

    #[error("signing failed: {0}")]
    SigningFailure(String),

    #[error("failed to resolve image reference {reference}: {source}")]
    ReferenceResolution {
        reference: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to load private key {path}: {source}")]
    KeyLoad {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unsupported format flag: {0}")]
    UnsupportedFormat(String),

    #[error("failed to upload signature to {address}: {source}")]
    Upload {
        address: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to read payload {path}: {source}")]
    PayloadRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write signature: {source}")]
    Output {
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}
