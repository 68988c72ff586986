//! Login gate for protected routes.
//!
//! [`require_login`] guards the form surface: an anonymous browser is sent
//! into the Google sign-in flow, with the page it asked for saved as the
//! target path. [`require_api_session`] guards `/api/*` when API protection
//! is enabled and answers `401` JSON instead of redirecting.
//!
//! Both gates are open when no identity provider is configured.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::AppError;
use crate::routes::oauth::begin_external_auth;
use crate::session::Session;
use crate::state::AppState;

/// Require a signed-in session, or start sign-in.
pub async fn require_login(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(provider) = state.identity.clone() else {
        return next.run(req).await;
    };

    let session = Session::from_headers(req.headers(), &state.sessions).await;
    if session.is_authenticated() {
        return next.run(req).await;
    }

    // Only a GET can be replayed by redirecting back to it.
    let target_path = (req.method() == Method::GET).then(|| {
        req.uri()
            .path_and_query()
            .map_or_else(|| req.uri().path().to_owned(), ToString::to_string)
    });
    debug!(path = %req.uri().path(), "anonymous request, starting sign-in");

    begin_external_auth(&state, provider.as_ref(), &session, target_path).await
}

/// Require a signed-in session for the JSON API.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] for an anonymous caller.
pub async fn require_api_session(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.protect_api || state.identity.is_none() {
        return Ok(next.run(req).await);
    }

    let session = Session::from_headers(req.headers(), &state.sessions).await;
    if !session.is_authenticated() {
        return Err(AppError::Unauthorized("authentication required".to_owned()));
    }

    Ok(next.run(req).await)
}
