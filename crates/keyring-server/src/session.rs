//! Server-side sessions.
//!
//! A session is addressed by the opaque `keyring_session` cookie and holds
//! the sign-in state machine:
//!
//! ```text
//! Anonymous ──(protected route or /connect/google)──▶ PendingExternalAuth
//! PendingExternalAuth ──(callback ok)──▶ Authenticated   (session id rotated)
//! PendingExternalAuth ──(callback error)──▶ Anonymous
//! ```
//!
//! Handlers read the current [`Session`] as an extractor. Only the OAuth
//! routes write a session, and only the callback writes an authenticated
//! identity.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "keyring_session";

/// Where a session is in the sign-in flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// No identity.
    #[default]
    Anonymous,
    /// Redirected to the identity provider; waiting for the callback.
    PendingExternalAuth {
        /// CSRF value echoed back in the `state` parameter.
        csrf_state: String,
        /// PKCE verifier for the token exchange.
        code_verifier: String,
    },
    /// Signed in as a local user.
    Authenticated { user_id: i64, email: String },
}

/// Everything stored for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub auth: AuthState,
    /// Path the user asked for before being sent to sign in.
    pub target_path: Option<String>,
}

#[derive(Debug)]
struct Entry {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// In-memory session table.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store whose sessions live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Load a live session.
    pub async fn load(&self, id: &str) -> Option<SessionData> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.data.clone())
    }

    /// Write `data` under `id` if that session is still live, otherwise
    /// under a fresh id. Returns the id the data was stored under.
    pub async fn save(&self, id: Option<&str>, data: SessionData) -> String {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = id
            .and_then(|id| sessions.get_mut(id))
            .filter(|entry| entry.expires_at > now)
        {
            entry.data = data;
            entry.expires_at = now + self.ttl;
            // Only reachable when `id` is `Some`.
            return id.map(str::to_owned).unwrap_or_default();
        }

        sessions.retain(|_, entry| entry.expires_at > now);
        let new_id = new_session_id();
        sessions.insert(
            new_id.clone(),
            Entry {
                data,
                expires_at: now + self.ttl,
            },
        );
        new_id
    }

    /// Drop `old` (if any) and store `data` under a fresh id.
    pub async fn rotate(&self, old: Option<&str>, data: SessionData) -> String {
        if let Some(old) = old {
            self.remove(old).await;
        }
        self.save(None, data).await
    }

    /// Drop a session.
    pub async fn remove(&self, id: &str) {
        self.sessions.write().await.remove(id);
    }
}

/// 128 bits of randomness, hex encoded.
fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// The caller's session as seen by a handler.
///
/// A request without a (live) session cookie yields an anonymous session
/// with no id; nothing is stored until a handler saves it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: Option<String>,
    pub data: SessionData,
}

impl Session {
    /// The session id, if the caller has a live session.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The signed-in user's email, if authenticated.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match &self.data.auth {
            AuthState::Authenticated { email, .. } => Some(email),
            _ => None,
        }
    }

    /// Whether the session carries an identity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.data.auth, AuthState::Authenticated { .. })
    }

    /// Resolve the session for a set of request headers.
    pub async fn from_headers(headers: &HeaderMap, store: &SessionStore) -> Self {
        let Some(id) = session_id_from_headers(headers) else {
            return Self::default();
        };
        match store.load(&id).await {
            Some(data) => Self { id: Some(id), data },
            None => Self::default(),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, &state.sessions).await)
    }
}

/// Extract the session id from the `Cookie` header(s).
fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_owned())
        })
}

/// `Set-Cookie` value binding the browser to session `id`.
#[must_use]
pub fn session_cookie(id: &str, secure: bool) -> HeaderValue {
    let secure = if secure { "; Secure" } else { "" };
    let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax{secure}");
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `Set-Cookie` value that removes the session cookie.
#[must_use]
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("keyring_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
