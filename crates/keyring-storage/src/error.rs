//! Storage error types.
//!
//! Every variant names the entity or operation involved so a log line is
//! enough to diagnose the failure.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to connect to or initialize the backend.
    #[error("failed to open storage at '{url}': {reason}")]
    Open { url: String, reason: String },

    /// Failed to read from storage.
    #[error("failed to read {entity}: {reason}")]
    Read { entity: String, reason: String },

    /// Failed to write to storage.
    #[error("failed to write {entity}: {reason}")]
    Write { entity: String, reason: String },

    /// Failed to delete from storage.
    #[error("failed to delete {entity}: {reason}")]
    Delete { entity: String, reason: String },

    /// A uniqueness constraint was violated.
    #[error("{field} '{value}' already exists")]
    Conflict { field: &'static str, value: String },
}
