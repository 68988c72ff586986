//! `PostgreSQL` storage backend.
//!
//! Stores keys in a `keys` table and users in a `users` table, both with
//! `BIGSERIAL` ids and a unique constraint on the natural key. Tables are
//! created on connect if they do not exist.
//!
//! Feature-gated behind `postgres-backend`. Uses `sqlx` with the Tokio
//! runtime; every trait method is a single statement, so each write is its
//! own transaction.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::{KeyRow, KeyStore, NewKeyRow, StorageError, UserRow, UserStore};

/// PostgreSQL error code for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS keys (\
        id             BIGSERIAL    PRIMARY KEY, \
        key_identifier VARCHAR(255) NOT NULL UNIQUE, \
        status         VARCHAR(255) NOT NULL, \
        created_at     TIMESTAMPTZ  NOT NULL, \
        updated_at     TIMESTAMPTZ  NULL\
    )",
    "CREATE TABLE IF NOT EXISTS users (\
        id         BIGSERIAL    PRIMARY KEY, \
        email      VARCHAR(180) NOT NULL UNIQUE, \
        created_at TIMESTAMPTZ  NOT NULL\
    )",
];

/// A key and user store backed by `PostgreSQL`.
///
/// Thread-safe via `PgPool` (connection pool).
///
/// # Examples
///
/// ```no_run
/// # use keyring_storage::PostgresStore;
/// # #[tokio::main]
/// # async fn main() {
/// let store = PostgresStore::connect("postgres://localhost/keyring").await.unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("pool", &"[PgPool]")
            .finish_non_exhaustive()
    }
}

impl PostgresStore {
    /// Connect to `PostgreSQL` and create the tables if missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the connection or schema setup fails.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Open {
                url: "[redacted]".to_owned(),
                reason: e.to_string(),
            })?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| StorageError::Open {
                    url: "[redacted]".to_owned(),
                    reason: format!("schema setup failed: {e}"),
                })?;
        }

        tracing::debug!("postgres schema ready");
        Ok(Self { pool })
    }
}

/// Map a write failure, turning unique violations into conflicts.
fn write_error(err: &sqlx::Error, entity: &str, field: &'static str, value: &str) -> StorageError {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StorageError::Conflict {
                field,
                value: value.to_owned(),
            };
        }
    }
    StorageError::Write {
        entity: entity.to_owned(),
        reason: err.to_string(),
    }
}

#[async_trait::async_trait]
impl KeyStore for PostgresStore {
    async fn list_keys(&self) -> Result<Vec<KeyRow>, StorageError> {
        sqlx::query_as::<_, KeyRow>("SELECT * FROM keys ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Read {
                entity: "keys".to_owned(),
                reason: e.to_string(),
            })
    }

    async fn get_key(&self, id: i64) -> Result<Option<KeyRow>, StorageError> {
        sqlx::query_as::<_, KeyRow>("SELECT * FROM keys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Read {
                entity: format!("key {id}"),
                reason: e.to_string(),
            })
    }

    async fn insert_key(&self, new: NewKeyRow) -> Result<KeyRow, StorageError> {
        sqlx::query_as::<_, KeyRow>(
            r"INSERT INTO keys (key_identifier, status, created_at)
              VALUES ($1, $2, $3)
              RETURNING *",
        )
        .bind(&new.key_identifier)
        .bind(&new.status)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(&e, "key", "key_identifier", &new.key_identifier))
    }

    async fn update_key(&self, row: &KeyRow) -> Result<Option<KeyRow>, StorageError> {
        sqlx::query_as::<_, KeyRow>(
            r"UPDATE keys
              SET key_identifier = $2, status = $3, updated_at = $4
              WHERE id = $1
              RETURNING *",
        )
        .bind(row.id)
        .bind(&row.key_identifier)
        .bind(&row.status)
        .bind(row.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(&e, &format!("key {}", row.id), "key_identifier", &row.key_identifier))
    }

    async fn delete_key(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM keys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Delete {
                entity: format!("key {id}"),
                reason: e.to_string(),
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StorageError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Read {
                entity: "user".to_owned(),
                reason: e.to_string(),
            })
    }

    async fn insert_user(
        &self,
        email: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UserRow, StorageError> {
        sqlx::query_as::<_, UserRow>(
            r"INSERT INTO users (email, created_at)
              VALUES ($1, $2)
              RETURNING *",
        )
        .bind(email)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(&e, "user", "email", email))
    }
}
