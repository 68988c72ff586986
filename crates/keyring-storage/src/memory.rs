//! In-memory storage backend.
//!
//! Keeps keys and users in `BTreeMap`s behind a single `RwLock`, so every
//! operation is atomic with respect to the others. Nothing is persisted —
//! all data is lost when the process exits. Use this for development and
//! for tests that need a real store without a database.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{KeyRow, KeyStore, NewKeyRow, StorageError, UserRow, UserStore};

#[derive(Debug, Default)]
struct Tables {
    keys: BTreeMap<i64, KeyRow>,
    users: BTreeMap<i64, UserRow>,
    last_key_id: i64,
    last_user_id: i64,
}

/// An in-memory store for keys and users.
///
/// Ids are assigned from per-table counters starting at 1 and are never
/// reused, matching a `BIGSERIAL` column. Cloning shares the same tables.
///
/// # Examples
///
/// ```
/// # use chrono::Utc;
/// # use keyring_storage::{KeyStore, MemoryStore, NewKeyRow};
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// let row = store
///     .insert_key(NewKeyRow {
///         key_identifier: "A1-B2".to_owned(),
///         status: "active".to_owned(),
///         created_at: Utc::now(),
///     })
///     .await
///     .unwrap();
/// assert_eq!(row.id, 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyStore for MemoryStore {
    async fn list_keys(&self) -> Result<Vec<KeyRow>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.keys.values().cloned().collect())
    }

    async fn get_key(&self, id: i64) -> Result<Option<KeyRow>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.keys.get(&id).cloned())
    }

    async fn insert_key(&self, new: NewKeyRow) -> Result<KeyRow, StorageError> {
        let mut tables = self.tables.write().await;
        if tables
            .keys
            .values()
            .any(|k| k.key_identifier == new.key_identifier)
        {
            return Err(StorageError::Conflict {
                field: "key_identifier",
                value: new.key_identifier,
            });
        }

        tables.last_key_id = tables.last_key_id.saturating_add(1);
        let row = KeyRow {
            id: tables.last_key_id,
            key_identifier: new.key_identifier,
            status: new.status,
            created_at: new.created_at,
            updated_at: None,
        };
        tables.keys.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_key(&self, row: &KeyRow) -> Result<Option<KeyRow>, StorageError> {
        let mut tables = self.tables.write().await;
        if tables
            .keys
            .values()
            .any(|k| k.id != row.id && k.key_identifier == row.key_identifier)
        {
            return Err(StorageError::Conflict {
                field: "key_identifier",
                value: row.key_identifier.clone(),
            });
        }

        let Some(existing) = tables.keys.get_mut(&row.id) else {
            return Ok(None);
        };
        existing.key_identifier.clone_from(&row.key_identifier);
        existing.status.clone_from(&row.status);
        existing.updated_at = row.updated_at;
        Ok(Some(existing.clone()))
    }

    async fn delete_key(&self, id: i64) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        Ok(tables.keys.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(
        &self,
        email: &str,
        created_at: DateTime<Utc>,
    ) -> Result<UserRow, StorageError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email) {
            return Err(StorageError::Conflict {
                field: "email",
                value: email.to_owned(),
            });
        }

        tables.last_user_id = tables.last_user_id.saturating_add(1);
        let row = UserRow {
            id: tables.last_user_id,
            email: email.to_owned(),
            created_at,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_key(identifier: &str) -> NewKeyRow {
        NewKeyRow {
            key_identifier: identifier.to_owned(),
            status: "active".to_owned(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.insert_key(new_key("a")).await.unwrap();
        let b = store.insert_key(new_key("b")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.updated_at, None);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let a = store.insert_key(new_key("a")).await.unwrap();
        assert!(store.delete_key(a.id).await.unwrap());
        let b = store.insert_key(new_key("b")).await.unwrap();
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn duplicate_identifier_conflicts() {
        let store = MemoryStore::new();
        store.insert_key(new_key("dup")).await.unwrap();
        let err = store.insert_key(new_key("dup")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { field: "key_identifier", .. }));
        assert_eq!(store.list_keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let store = MemoryStore::new();
        for name in ["c", "a", "b"] {
            store.insert_key(new_key(name)).await.unwrap();
        }
        let names: Vec<String> = store
            .list_keys()
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.key_identifier)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn update_rewrites_mutable_columns_only() {
        let store = MemoryStore::new();
        let original = store.insert_key(new_key("a")).await.unwrap();

        let mut changed = original.clone();
        changed.key_identifier = "renamed".to_owned();
        changed.status = "inactive".to_owned();
        changed.updated_at = Some(Utc::now());
        changed.created_at = Utc::now() + chrono::Duration::days(1);

        let stored = store.update_key(&changed).await.unwrap().unwrap();
        assert_eq!(stored.key_identifier, "renamed");
        assert_eq!(stored.status, "inactive");
        assert_eq!(stored.created_at, original.created_at);
        assert_eq!(stored.updated_at, changed.updated_at);
    }

    #[tokio::test]
    async fn update_onto_other_identifier_conflicts() {
        let store = MemoryStore::new();
        store.insert_key(new_key("a")).await.unwrap();
        let mut b = store.insert_key(new_key("b")).await.unwrap();
        b.key_identifier = "a".to_owned();
        let err = store.update_key(&b).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn update_keeping_own_identifier_is_allowed() {
        let store = MemoryStore::new();
        let mut a = store.insert_key(new_key("a")).await.unwrap();
        a.status = "inactive".to_owned();
        assert!(store.update_key(&a).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_missing_returns_none() {
        let store = MemoryStore::new();
        let ghost = KeyRow {
            id: 42,
            key_identifier: "ghost".to_owned(),
            status: "active".to_owned(),
            created_at: Utc::now(),
            updated_at: None,
        };
        assert!(store.update_key(&ghost).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_returns_false() {
        let store = MemoryStore::new();
        assert!(!store.delete_key(7).await.unwrap());
    }

    #[tokio::test]
    async fn users_are_unique_by_email() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let user = store.insert_user("admin@example.com", now).await.unwrap();
        assert_eq!(user.id, 1);

        let found = store.find_user_by_email("admin@example.com").await.unwrap();
        assert_eq!(found, Some(user));

        let err = store
            .insert_user("admin@example.com", now)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { field: "email", .. }));
    }
}
