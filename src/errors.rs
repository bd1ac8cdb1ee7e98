// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error type shared by the ledger, NAV and point-of-sale modules.

use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Rejected input; the caller can correct it and try again.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The acting user's role or asset assignment does not allow the operation.
    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Checkout was attempted without any cart lines. Nothing was written.
    #[error("Cannot check out an empty cart")]
    EmptyCart,

    /// The database stayed locked by another writer after all retries.
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Session payload error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        CoreError::Permission(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }
}

/// Map a missing row to `NotFound`, leave every other database error alone.
pub trait OptionalRow<T> {
    fn or_not_found(self, what: impl FnOnce() -> String) -> CoreResult<T>;
}

impl<T> OptionalRow<T> for rusqlite::Result<T> {
    fn or_not_found(self, what: impl FnOnce() -> String) -> CoreResult<T> {
        match self {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CoreError::NotFound(what())),
            Err(e) => Err(CoreError::Database(e)),
        }
    }
}
