//! Shared application state for the Keyring server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. It holds the key and user services, the session
//! table, and the identity provider (when sign-in is configured).

use std::sync::Arc;

use keyring_core::clock::Clock;
use keyring_core::service::{KeyService, UserService};
use keyring_storage::{KeyStore, UserStore};

use crate::config::ServerConfig;
use crate::identity::IdentityProvider;
use crate::session::SessionStore;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Key CRUD.
    pub keys: KeyService,
    /// User resolution for sign-in.
    pub users: UserService,
    /// Server-side sessions.
    pub sessions: SessionStore,
    /// Identity provider (None if sign-in is not configured).
    pub identity: Option<Arc<dyn IdentityProvider>>,
    /// Whether `/api/*` requires a signed-in session.
    pub protect_api: bool,
    /// Whether the session cookie is marked `Secure`.
    pub cookie_secure: bool,
}

impl AppState {
    /// Wire services over one store that holds both keys and users.
    #[must_use]
    pub fn new<S>(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        identity: Option<Arc<dyn IdentityProvider>>,
        config: &ServerConfig,
    ) -> Self
    where
        S: KeyStore + UserStore,
    {
        Self {
            keys: KeyService::new(store.clone(), Arc::clone(&clock)),
            users: UserService::new(store, clock),
            sessions: SessionStore::new(chrono::Duration::seconds(config.session_ttl_secs)),
            identity,
            protect_api: config.protect_api,
            cookie_secure: config.cookie_secure,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sign_in_enabled", &self.identity.is_some())
            .field("protect_api", &self.protect_api)
            .finish_non_exhaustive()
    }
}
