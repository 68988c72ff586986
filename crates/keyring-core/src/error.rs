//! Error types for `keyring-core`.
//!
//! Each variant carries the offending id, value, or reason so the HTTP layer
//! can surface it without re-deriving context.

use keyring_storage::StorageError;

/// Errors from key operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// A field was missing or invalid. Nothing was persisted.
    #[error("{reason}")]
    Validation { reason: String },

    /// No key exists with this id.
    #[error("key {id} not found")]
    NotFound { id: i64 },

    /// Another key already uses this identifier.
    #[error("key identifier '{identifier}' already exists")]
    Conflict { identifier: String },

    /// The store returned a row this crate cannot interpret.
    #[error("corrupt key record {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    /// The underlying store failed.
    #[error("key storage error: {0}")]
    Storage(StorageError),
}

impl KeyError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

impl From<StorageError> for KeyError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { value, .. } => Self::Conflict { identifier: value },
            other => Self::Storage(other),
        }
    }
}

/// Errors from user resolution.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// The external identity carried no usable email.
    #[error("invalid email: {reason}")]
    InvalidEmail { reason: String },

    /// The underlying store failed.
    #[error("user storage error: {0}")]
    Storage(#[from] StorageError),
}
