//! Router test harness: an in-memory app, a scripted identity provider, and
//! request/response helpers for driving the router with `oneshot`.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use keyring_core::clock::ManualClock;
use keyring_storage::MemoryStore;

use crate::config::ServerConfig;
use crate::identity::{ExternalAuthError, IdentityProvider, SCOPES};
use crate::routes::build_router;
use crate::session::{AuthState, SESSION_COOKIE};
use crate::state::AppState;

/// Identity provider that answers every exchange the same way.
#[derive(Debug, Clone)]
pub struct FakeProvider {
    outcome: Result<String, String>,
}

impl FakeProvider {
    pub fn ok(email: &str) -> Self {
        Self {
            outcome: Ok(email.to_owned()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_owned()),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeProvider {
    fn authorize_url(&self, csrf_state: &str, code_challenge: &str) -> String {
        format!(
            "https://accounts.example/auth?scope={}&state={}&code_challenge={}",
            urlencoding::encode(SCOPES),
            urlencoding::encode(csrf_state),
            urlencoding::encode(code_challenge),
        )
    }

    async fn fetch_email(
        &self,
        _code: &str,
        _code_verifier: &str,
    ) -> Result<String, ExternalAuthError> {
        self.outcome.clone().map_err(ExternalAuthError::Provider)
    }
}

/// A router plus the state behind it.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    /// Hit `/connect/google`; returns the session cookie and CSRF state.
    pub async fn start_sign_in(&self) -> (String, String) {
        let resp = send(self, get("/connect/google")).await;
        let cookie = cookie_from(&resp).unwrap();
        let csrf = self.pending_state(&cookie).await;
        (cookie, csrf)
    }

    /// The CSRF state stored in a pending session.
    pub async fn pending_state(&self, cookie: &str) -> String {
        let id = cookie.trim_start_matches(SESSION_COOKIE).trim_start_matches('=');
        match self.state.sessions.load(id).await.unwrap().auth {
            AuthState::PendingExternalAuth { csrf_state, .. } => csrf_state,
            other => panic!("expected a pending sign-in, got {other:?}"),
        }
    }

    /// Run the full sign-in flow; returns the authenticated session cookie.
    pub async fn signed_in_cookie(&self) -> String {
        let (cookie, csrf) = self.start_sign_in().await;
        let resp = send(
            self,
            with_cookie(get(&format!("/connect/google/check?code=c&state={csrf}")), &cookie),
        )
        .await;
        cookie_from(&resp).unwrap()
    }
}

/// In-memory app; sign-in is enabled when `provider` is given.
pub fn test_app(provider: Option<FakeProvider>) -> TestApp {
    test_app_with(provider, |_| None)
}

/// In-memory app configured from the given variables.
pub fn test_app_with(
    provider: Option<FakeProvider>,
    var: impl Fn(&str) -> Option<String>,
) -> TestApp {
    let config = ServerConfig::from_lookup(var);
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::stepping(start, Duration::seconds(1)));
    let identity = provider.map(|p| Arc::new(p) as Arc<dyn IdentityProvider>);

    let state = Arc::new(AppState::new(
        Arc::new(MemoryStore::new()),
        clock,
        identity,
        &config,
    ));
    TestApp {
        router: build_router(Arc::clone(&state)),
        state,
    }
}

pub async fn send(app: &TestApp, req: Request<Body>) -> Response {
    app.router.clone().oneshot(req).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

pub fn send_json(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

pub fn with_cookie(mut req: Request<Body>, cookie: &str) -> Request<Body> {
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    req
}

/// `name=value` of the session cookie set by `resp`.
pub fn cookie_from(resp: &Response) -> Option<String> {
    let value = resp.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    value.split(';').next().map(str::to_owned)
}

pub fn location(resp: &Response) -> String {
    resp.headers()[header::LOCATION].to_str().unwrap().to_owned()
}

pub async fn text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn json(resp: Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
