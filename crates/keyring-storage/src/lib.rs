//! Storage backend abstraction for Keyring.
//!
//! This crate defines the [`KeyStore`] and [`UserStore`] traits — plain
//! persistence interfaces that know nothing about validation, status rules,
//! or HTTP. The service layer in `keyring-core` wraps a store and owns every
//! business rule; this layer only guarantees identifier/email uniqueness and
//! surrogate id assignment.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStore`] — in-memory, for development and tests
//! - [`PostgresStore`] — `PostgreSQL` via `sqlx` (feature `postgres-backend`)

mod error;
mod memory;
#[cfg(feature = "postgres-backend")]
mod postgres_backend;
mod row;

pub use error::StorageError;
pub use memory::MemoryStore;
#[cfg(feature = "postgres-backend")]
pub use postgres_backend::PostgresStore;
pub use row::{KeyRow, NewKeyRow, UserRow};

use chrono::{DateTime, Utc};

/// Persistence for key records.
///
/// Every method is a single atomic operation against the backend. Rows are
/// returned exactly as stored; status strings are not interpreted here.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait KeyStore: Send + Sync + 'static {
    /// List all keys ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn list_keys(&self) -> Result<Vec<KeyRow>, StorageError>;

    /// Fetch a key by id.
    ///
    /// Returns `Ok(None)` if no key has this id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn get_key(&self, id: i64) -> Result<Option<KeyRow>, StorageError>;

    /// Insert a new key and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if another key already uses the
    /// identifier, or [`StorageError::Write`] if the backend fails.
    async fn insert_key(&self, new: NewKeyRow) -> Result<KeyRow, StorageError>;

    /// Overwrite the mutable columns of an existing key.
    ///
    /// `row.id` selects the record; `created_at` is never rewritten. Returns
    /// `Ok(None)` if no key has this id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if the new identifier belongs to a
    /// different key, or [`StorageError::Write`] if the backend fails.
    async fn update_key(&self, row: &KeyRow) -> Result<Option<KeyRow>, StorageError>;

    /// Delete a key. Returns `true` if a record was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the underlying backend fails.
    async fn delete_key(&self, id: i64) -> Result<bool, StorageError>;
}

/// Persistence for users resolved from the external identity provider.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Look up a user by (already normalized) email.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StorageError>;

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if the email is already registered,
    /// or [`StorageError::Write`] if the backend fails.
    async fn insert_user(
        &self,
        email: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UserRow, StorageError>;
}
