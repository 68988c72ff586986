//! Row types exchanged with the stores.

use chrono::{DateTime, Utc};

/// A stored key, as persisted in the `keys` table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "postgres-backend", derive(sqlx::FromRow))]
pub struct KeyRow {
    pub id: i64,
    pub key_identifier: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Column values for a key that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKeyRow {
    pub key_identifier: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A stored user, as persisted in the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "postgres-backend", derive(sqlx::FromRow))]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
