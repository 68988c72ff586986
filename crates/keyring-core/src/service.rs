//! Key and user services.
//!
//! [`KeyService`] is the only writer of key records. It validates input,
//! stamps `created_at`/`updated_at` from its [`Clock`], and performs exactly
//! one store operation per mutation — there are no hooks, retries, or
//! multi-step writes. Concurrent edits to the same key are last-write-wins.

use std::sync::Arc;

use keyring_storage::{KeyStore, NewKeyRow, StorageError, UserStore};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{KeyError, UserError};
use crate::key::{validate_identifier, Key, KeyStatus};
use crate::user::{normalize_email, User};

/// CRUD operations over the key store.
#[derive(Clone)]
pub struct KeyService {
    store: Arc<dyn KeyStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for KeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyService").finish_non_exhaustive()
    }
}

impl KeyService {
    /// Create a service over `store`, stamping times from `clock`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// List every key in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Storage`] if the store fails.
    pub async fn list(&self) -> Result<Vec<Key>, KeyError> {
        self.store
            .list_keys()
            .await?
            .into_iter()
            .map(Key::try_from)
            .collect()
    }

    /// Create a key with status `active`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Validation`] if the identifier is blank or too
    /// long, or [`KeyError::Conflict`] if it is already taken.
    pub async fn create(&self, identifier: &str) -> Result<Key, KeyError> {
        let identifier = validate_identifier(identifier)?;
        let row = self
            .store
            .insert_key(NewKeyRow {
                key_identifier: identifier,
                status: KeyStatus::default().as_str().to_owned(),
                created_at: self.clock.now(),
            })
            .await?;

        let key = Key::try_from(row)?;
        info!(id = key.id, identifier = %key.identifier, "key created");
        Ok(key)
    }

    /// Fetch a key by id.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::NotFound`] if no key has this id.
    pub async fn get_by_id(&self, id: i64) -> Result<Key, KeyError> {
        let row = self
            .store
            .get_key(id)
            .await?
            .ok_or(KeyError::NotFound { id })?;
        Key::try_from(row)
    }

    /// Set a key's status from its wire spelling.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::NotFound`] if no key has this id, or
    /// [`KeyError::Validation`] if `status` is not `active`/`inactive`.
    pub async fn update_status(&self, id: i64, status: &str) -> Result<Key, KeyError> {
        let mut key = self.get_by_id(id).await?;
        key.status = status.parse()?;
        self.save(key).await
    }

    /// Replace both the identifier and the status of a key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::NotFound`] if no key has this id,
    /// [`KeyError::Validation`] if either field is invalid, or
    /// [`KeyError::Conflict`] if the identifier belongs to another key.
    pub async fn update_full(
        &self,
        id: i64,
        identifier: &str,
        status: &str,
    ) -> Result<Key, KeyError> {
        let mut key = self.get_by_id(id).await?;
        key.identifier = validate_identifier(identifier)?;
        key.status = status.parse()?;
        self.save(key).await
    }

    /// Flip a key between `active` and `inactive`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::NotFound`] if no key has this id.
    pub async fn toggle_status(&self, id: i64) -> Result<Key, KeyError> {
        let mut key = self.get_by_id(id).await?;
        key.status = key.status.toggled();
        self.save(key).await
    }

    /// Permanently remove a key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::NotFound`] if no key has this id.
    pub async fn delete(&self, id: i64) -> Result<(), KeyError> {
        if !self.store.delete_key(id).await? {
            return Err(KeyError::NotFound { id });
        }
        info!(id, "key deleted");
        Ok(())
    }

    /// Stamp `updated_at` and write the mutable fields back.
    async fn save(&self, mut key: Key) -> Result<Key, KeyError> {
        let id = key.id;
        key.updated_at = Some(self.clock.now());
        let row = self
            .store
            .update_key(&key.into_row())
            .await?
            // Deleted between the lookup and the write.
            .ok_or(KeyError::NotFound { id })?;

        let key = Key::try_from(row)?;
        debug!(id, status = %key.status, "key updated");
        Ok(key)
    }
}

/// Resolves external identities to local users.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}

impl UserService {
    /// Create a service over `store`, stamping times from `clock`.
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Return the user with this email, creating it on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidEmail`] if the email is unusable, or
    /// [`UserError::Storage`] if the store fails.
    pub async fn find_or_create(&self, email: &str) -> Result<User, UserError> {
        let email = normalize_email(email)?;
        if let Some(row) = self.store.find_user_by_email(&email).await? {
            return Ok(row.into());
        }

        match self.store.insert_user(&email, self.clock.now()).await {
            Ok(row) => {
                info!(user_id = row.id, email = %row.email, "user created on first login");
                Ok(row.into())
            }
            // Lost a race with a concurrent first login for the same email.
            Err(StorageError::Conflict { .. }) => self
                .store
                .find_user_by_email(&email)
                .await?
                .map(User::from)
                .ok_or_else(|| {
                    UserError::Storage(StorageError::Read {
                        entity: "user".to_owned(),
                        reason: format!("'{email}' conflicted on insert but is missing"),
                    })
                }),
            Err(e) => Err(e.into()),
        }
    }
}
