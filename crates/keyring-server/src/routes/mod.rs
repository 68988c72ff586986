//! HTTP routes for the Keyring server.
//!
//! - `/api/keys*` — JSON API ([`api`])
//! - `/`, `/create`, `/key/{id}/*` — HTML page and form surface ([`web`])
//! - `/connect/google*`, `/logout` — sign-in ([`oauth`])
//! - `/api/doc.json` — OpenAPI document ([`docs`])
//! - `/health` — liveness

pub mod api;
pub mod docs;
pub mod oauth;
pub mod web;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware as axum_mw;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, PageError};
use crate::middleware::{require_api_session, require_login};
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = api::router().route_layer(axum_mw::from_fn_with_state(
        Arc::clone(&state),
        require_api_session,
    ));

    let web_routes = web::router().route_layer(axum_mw::from_fn_with_state(
        Arc::clone(&state),
        require_login,
    ));

    Router::new()
        .merge(api_routes)
        .merge(web_routes)
        .merge(oauth::router())
        .merge(docs::router())
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => AppError::Internal(format!("invalid redirect target: {location}")).into_response(),
    }
}

// ── Extractors ───────────────────────────────────────────────────────

/// `Json` whose rejections render as `{"error": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejections render as `{"error": ...}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `Path` whose rejections render as plain text.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(PageError))]
pub struct PagePath<T>(pub T);

/// `Form` whose rejections render as plain text.
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(PageError))]
pub struct PageForm<T>(pub T);
