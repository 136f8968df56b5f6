/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::{io, path::Path};

/// Boxed error type used to carry opaque store failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single download transfer
#[derive(thiserror::Error, Debug)]
pub enum TransferError {
    /// The request or environment was rejected before any network call was made
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The store reported that the object does not exist
    #[error("object not found: {location}")]
    ObjectNotFound { location: String },

    /// Any other store failure (auth, network, throttling, short reads)
    #[error("store request failed: {context}")]
    Store {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Local filesystem failure
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A spawned download task panicked or was cancelled
    #[error("download task failed")]
    Task(#[from] tokio::task::JoinError),
}

impl TransferError {
    /// Wrap an opaque store failure
    pub fn store<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        TransferError::Store {
            context: context.into(),
            source: source.into(),
        }
    }

    /// The object identified by `location` does not exist
    pub fn not_found(location: impl Into<String>) -> Self {
        TransferError::ObjectNotFound {
            location: location.into(),
        }
    }

    /// Returns true if this error is the store reporting a missing object
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransferError::ObjectNotFound { .. })
    }
}

pub(crate) fn invalid_configuration(message: impl Into<String>) -> TransferError {
    TransferError::InvalidConfiguration(message.into())
}

pub(crate) fn io_failed(action: &str, path: &Path, source: io::Error) -> TransferError {
    TransferError::Io {
        context: format!("failed to {} {}", action, path.display()),
        source,
    }
}
