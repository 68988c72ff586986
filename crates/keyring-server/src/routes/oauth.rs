//! Google sign-in routes: `/connect/google`, `/connect/google/check`, `/logout`.
//!
//! Authorization Code + PKCE flow. `/connect/google` (or the login gate on a
//! protected route) stores a CSRF state and PKCE verifier in the session and
//! redirects to the provider. The callback checks the state, exchanges the
//! code for the account email, finds or creates the local user, rotates the
//! session id, and redirects to the saved target path or `/`.
//!
//! Failures never redirect. A callback whose state does not match is
//! answered `403` and the pending sign-in is left alone. Any other failure
//! drops the session back to anonymous and returns the provider's message as
//! plain text with `403 Forbidden`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::identity::{code_challenge, new_code_verifier, IdentityProvider};
use crate::routes::found;
use crate::session::{clear_session_cookie, session_cookie, AuthState, Session, SessionData};
use crate::state::AppState;

/// Build the sign-in router (unauthenticated — these are the login flow).
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/connect/google", get(connect))
        .route("/connect/google/check", get(check))
        .route("/logout", post(logout))
}

/// Query parameters returned by the provider on callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Move `session` to `PendingExternalAuth` and redirect to the provider.
///
/// `target_path` replaces the saved target when given; otherwise any target
/// saved by an earlier attempt is kept.
pub(crate) async fn begin_external_auth(
    state: &AppState,
    provider: &dyn IdentityProvider,
    session: &Session,
    target_path: Option<String>,
) -> Response {
    let csrf_state = uuid::Uuid::new_v4().to_string();
    let code_verifier = new_code_verifier();
    let authorize_url = provider.authorize_url(&csrf_state, &code_challenge(&code_verifier));

    let data = SessionData {
        auth: AuthState::PendingExternalAuth {
            csrf_state,
            code_verifier,
        },
        target_path: target_path.or_else(|| session.data.target_path.clone()),
    };
    let id = state.sessions.save(session.id(), data).await;

    let mut response = found(&authorize_url);
    response
        .headers_mut()
        .insert(header::SET_COOKIE, session_cookie(&id, state.cookie_secure));
    response
}

/// `GET /connect/google` — start sign-in.
async fn connect(State(state): State<Arc<AppState>>, session: Session) -> Result<Response, AppError> {
    let provider = state
        .identity
        .clone()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".to_owned()))?;

    if session.is_authenticated() {
        return Ok(found("/"));
    }

    Ok(begin_external_auth(&state, provider.as_ref(), &session, None).await)
}

/// `GET /connect/google/check` — the provider's redirect back.
async fn check(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let provider = state
        .identity
        .clone()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".to_owned()))?;

    let AuthState::PendingExternalAuth {
        csrf_state,
        code_verifier,
    } = session.data.auth.clone()
    else {
        warn!("sign-in callback without a pending sign-in");
        return Ok(forbidden("No sign-in in progress."));
    };

    match complete(&state, provider.as_ref(), &query, &csrf_state, &code_verifier).await {
        Ok((user_id, email)) => {
            let target = session.data.target_path.clone();
            let data = SessionData {
                auth: AuthState::Authenticated {
                    user_id,
                    email: email.clone(),
                },
                target_path: None,
            };
            let id = state.sessions.rotate(session.id(), data).await;
            info!(user_id, email = %email, "sign-in successful");

            let mut response = found(target.as_deref().unwrap_or("/"));
            response
                .headers_mut()
                .insert(header::SET_COOKIE, session_cookie(&id, state.cookie_secure));
            Ok(response)
        }
        Err(CallbackError::Refused(message)) => {
            warn!(reason = %message, "sign-in refused");
            // Back to anonymous; the saved target survives for the next attempt.
            let data = SessionData {
                auth: AuthState::Anonymous,
                target_path: session.data.target_path.clone(),
            };
            state.sessions.save(session.id(), data).await;
            Ok(forbidden(&message))
        }
        Err(CallbackError::StateMismatch) => {
            // Not from our redirect: leave the pending sign-in as it is.
            warn!("sign-in callback with a mismatched state");
            Ok(forbidden("Invalid state parameter."))
        }
        Err(CallbackError::App(err)) => Err(err),
    }
}

enum CallbackError {
    /// The `state` parameter does not match the pending sign-in.
    StateMismatch,
    /// Shown to the user as a 403.
    Refused(String),
    /// Our own failure (storage).
    App(AppError),
}

/// Validate the callback and resolve the local user.
async fn complete(
    state: &AppState,
    provider: &dyn IdentityProvider,
    query: &CallbackQuery,
    csrf_state: &str,
    code_verifier: &str,
) -> Result<(i64, String), CallbackError> {
    if query.state.as_deref() != Some(csrf_state) {
        return Err(CallbackError::StateMismatch);
    }

    if let Some(err) = &query.error {
        let message = query.error_description.clone().unwrap_or_else(|| err.clone());
        return Err(CallbackError::Refused(message));
    }

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CallbackError::Refused("Missing authorization code.".to_owned()))?;

    let email = provider
        .fetch_email(code, code_verifier)
        .await
        .map_err(|e| CallbackError::Refused(e.to_string()))?;

    match state.users.find_or_create(&email).await {
        Ok(user) => Ok((user.id, user.email)),
        Err(err) => match AppError::from(err) {
            AppError::Forbidden(message) => Err(CallbackError::Refused(message)),
            other => Err(CallbackError::App(other)),
        },
    }
}

/// `POST /logout` — drop the session.
async fn logout(State(state): State<Arc<AppState>>, session: Session) -> Response {
    if let Some(id) = session.id() {
        state.sessions.remove(id).await;
        if let Some(email) = session.email() {
            info!(email = %email, "signed out");
        }
    }

    let mut response = found("/");
    response
        .headers_mut()
        .insert(header::SET_COOKIE, clear_session_cookie());
    response
}

fn forbidden(message: &str) -> Response {
    (StatusCode::FORBIDDEN, message.to_owned()).into_response()
}
