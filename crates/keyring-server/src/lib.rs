//! Keyring HTTP server.
//!
//! Wires the key service and storage backend into an Axum router. Serves
//! the JSON API at `/api/keys*`, the admin page and its forms at `/`, and
//! Google sign-in at `/connect/google*`.

pub mod config;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
