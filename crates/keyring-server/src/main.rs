//! Keyring server entry point.
//!
//! Loads configuration, opens the storage backend, wires the services and
//! the optional Google identity provider, then serves the Axum router with
//! graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use keyring_core::clock::{Clock, SystemClock};
use keyring_server::config::{ServerConfig, StorageBackendType};
use keyring_server::identity::IdentityProvider;
use keyring_server::routes;
use keyring_server::state::AppState;
use keyring_storage::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(storage = ?config.storage_backend, "Keyring starting");

    let state = build_app_state(&config).await?;
    let app = routes::build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Keyring server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Keyring server stopped");
    Ok(())
}

/// Open the configured store and build the shared application state.
async fn build_app_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let identity = build_identity_provider(config);

    let state = match &config.storage_backend {
        StorageBackendType::Memory => {
            info!("using in-memory storage (data will not persist)");
            AppState::new(Arc::new(MemoryStore::new()), clock, identity, config)
        }
        #[cfg(feature = "postgres-backend")]
        StorageBackendType::Postgres { url } => {
            let store = keyring_storage::PostgresStore::connect(url)
                .await
                .context("failed to connect to PostgreSQL")?;
            info!("using PostgreSQL storage");
            AppState::new(Arc::new(store), clock, identity, config)
        }
        #[cfg(not(feature = "postgres-backend"))]
        StorageBackendType::Postgres { .. } => {
            anyhow::bail!(
                "PostgreSQL storage requested but this binary was built without the \
                 `postgres-backend` feature"
            );
        }
    };

    Ok(Arc::new(state))
}

/// The Google provider, if credentials are configured.
fn build_identity_provider(config: &ServerConfig) -> Option<Arc<dyn IdentityProvider>> {
    let Some(google) = config.google_oauth.clone() else {
        warn!("GOOGLE_CLIENT_ID not set, sign-in is disabled and every route is open");
        return None;
    };
    google_provider(google)
}

#[cfg(feature = "google-oauth")]
fn google_provider(
    google: keyring_server::config::GoogleOAuthConfig,
) -> Option<Arc<dyn IdentityProvider>> {
    info!(redirect_uri = %google.redirect_uri, "Google sign-in enabled");
    Some(Arc::new(keyring_server::identity::GoogleProvider::new(google)))
}

#[cfg(not(feature = "google-oauth"))]
fn google_provider(
    _google: keyring_server::config::GoogleOAuthConfig,
) -> Option<Arc<dyn IdentityProvider>> {
    warn!("Google sign-in configured but this binary was built without `google-oauth`");
    None
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
