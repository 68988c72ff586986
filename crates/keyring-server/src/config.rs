//! Server configuration for Keyring.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `KEYRING_*` (and `GOOGLE_*`)
//! environment variables.

use std::net::SocketAddr;

/// Default Google authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Default Google token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Default Google userinfo endpoint.
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Whether `/api/*` requires a signed-in session.
    pub protect_api: bool,
    /// Whether the session cookie is marked `Secure`.
    pub cookie_secure: bool,
    /// Lifetime of a session in seconds.
    pub session_ttl_secs: i64,
    /// Google OAuth configuration (optional — enables "Sign in with Google").
    pub google_oauth: Option<GoogleOAuthConfig>,
}

/// Configuration for Google OAuth 2.0 sign-in.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID registered with Google.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Absolute URL of `/connect/google/check` as registered with Google.
    pub redirect_uri: String,
    /// Authorization endpoint.
    pub auth_url: String,
    /// Token endpoint.
    pub token_url: String,
    /// Userinfo endpoint.
    pub userinfo_url: String,
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// `PostgreSQL` persistent storage.
    Postgres { url: String },
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` — port to bind on (binds to `0.0.0.0`)
    /// - `KEYRING_BIND_ADDR` — full bind address (overrides `PORT`, default: `127.0.0.1:8000`)
    /// - `KEYRING_STORAGE` — `memory` or `postgres` (default: `memory`)
    /// - `DATABASE_URL` — `PostgreSQL` connection string (used when `KEYRING_STORAGE=postgres`)
    /// - `KEYRING_LOG_LEVEL` — log filter (default: `info`)
    /// - `KEYRING_PROTECT_API` — require a session for the JSON API (default: `false`)
    /// - `KEYRING_COOKIE_SECURE` — mark the session cookie `Secure` (default: `false`)
    /// - `KEYRING_SESSION_TTL` — session lifetime in seconds (default: `28800`)
    /// - `GOOGLE_CLIENT_ID` — enables Google sign-in when set
    /// - `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URI` — OAuth client settings
    /// - `GOOGLE_AUTH_URL`, `GOOGLE_TOKEN_URL`, `GOOGLE_USERINFO_URL` — endpoint overrides
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| {
            var(name)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false)
        };

        // Priority: KEYRING_BIND_ADDR > PORT > default 127.0.0.1:8000
        let bind_addr = if let Some(addr) = var("KEYRING_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8000)))
        } else if let Some(port_str) = var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(8000);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], 8000))
        };

        let storage_backend = match var("KEYRING_STORAGE")
            .unwrap_or_else(|| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => StorageBackendType::Postgres {
                url: var("DATABASE_URL")
                    .unwrap_or_else(|| "postgres://localhost/keyring".to_owned()),
            },
            _ => StorageBackendType::Memory,
        };

        let log_level = var("KEYRING_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let session_ttl_secs = var("KEYRING_SESSION_TTL")
            .and_then(|v| v.parse().ok())
            .filter(|secs: &i64| *secs > 0)
            .unwrap_or(8 * 60 * 60);

        // Google sign-in — enabled when GOOGLE_CLIENT_ID is set.
        let google_oauth = var("GOOGLE_CLIENT_ID")
            .filter(|id| !id.is_empty())
            .map(|client_id| GoogleOAuthConfig {
                client_id,
                client_secret: var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
                redirect_uri: var("GOOGLE_REDIRECT_URI").unwrap_or_else(|| {
                    "http://localhost:8000/connect/google/check".to_owned()
                }),
                auth_url: var("GOOGLE_AUTH_URL").unwrap_or_else(|| GOOGLE_AUTH_URL.to_owned()),
                token_url: var("GOOGLE_TOKEN_URL").unwrap_or_else(|| GOOGLE_TOKEN_URL.to_owned()),
                userinfo_url: var("GOOGLE_USERINFO_URL")
                    .unwrap_or_else(|| GOOGLE_USERINFO_URL.to_owned()),
            });

        Self {
            bind_addr,
            storage_backend,
            log_level,
            protect_api: flag("KEYRING_PROTECT_API"),
            cookie_secure: flag("KEYRING_COOKIE_SECURE"),
            session_ttl_secs,
            google_oauth,
        }
    }
}
