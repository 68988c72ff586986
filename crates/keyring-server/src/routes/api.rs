//! Key API routes: `/api/keys*`
//!
//! JSON in, JSON out. Every failure is a `{"error": "..."}` body with the
//! status from [`AppError`].

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use keyring_core::key::Key;

use crate::error::AppError;
use crate::routes::{ApiJson, ApiPath};
use crate::state::AppState;

/// Timestamp format used in every response.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Build the key API router.
///
/// Paths:
/// - `GET    /api/keys`       — list
/// - `POST   /api/keys`       — create
/// - `GET    /api/keys/{id}`  — read
/// - `PATCH  /api/keys/{id}`  — set status
/// - `PUT    /api/keys/{id}`  — replace identifier and status
/// - `DELETE /api/keys/{id}`  — delete
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/keys", get(list_keys).post(create_key))
        .route(
            "/api/keys/{id}",
            get(get_key)
                .patch(update_status)
                .put(update_key)
                .delete(delete_key),
        )
}

// ── Request / response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyRequest {
    #[serde(default, alias = "identifier")]
    pub key_identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKeyRequest {
    #[serde(default, alias = "identifier")]
    pub key_identifier: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResponse {
    pub id: i64,
    pub key_identifier: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<Key> for KeyResponse {
    fn from(key: Key) -> Self {
        Self {
            id: key.id,
            key_identifier: key.identifier,
            status: key.status.to_string(),
            created_at: key.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: key
                .updated_at
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn list_keys(State(state): State<Arc<AppState>>) -> Result<Json<Vec<KeyResponse>>, AppError> {
    let keys = state.keys.list().await?;
    Ok(Json(keys.into_iter().map(KeyResponse::from).collect()))
}

async fn create_key(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CreateKeyRequest>,
) -> Result<(StatusCode, Json<KeyResponse>), AppError> {
    let key = state
        .keys
        .create(body.key_identifier.as_deref().unwrap_or_default())
        .await?;
    Ok((StatusCode::CREATED, Json(key.into())))
}

async fn get_key(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<KeyResponse>, AppError> {
    Ok(Json(state.keys.get_by_id(id).await?.into()))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<Json<KeyResponse>, AppError> {
    let key = state
        .keys
        .update_status(id, body.status.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(key.into()))
}

async fn update_key(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateKeyRequest>,
) -> Result<Json<KeyResponse>, AppError> {
    let key = state
        .keys
        .update_full(
            id,
            body.key_identifier.as_deref().unwrap_or_default(),
            body.status.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(key.into()))
}

async fn delete_key(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    state.keys.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::{
        delete, get, json, send, send_json, test_app, test_app_with, text, with_cookie, FakeProvider,
        TestApp,
    };

    async fn create(app: &TestApp, identifier: &str) -> serde_json::Value {
        let resp = send(
            app,
            send_json(Method::POST, "/api/keys", &json!({ "keyIdentifier": identifier })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        json(resp).await
    }

    #[tokio::test]
    async fn end_to_end_lifecycle() {
        let app = test_app(None);

        let created = create(&app, "A1-B2-C3-D4").await;
        assert_eq!(created["keyIdentifier"], "A1-B2-C3-D4");
        assert_eq!(created["status"], "active");
        assert_eq!(created["createdAt"], "2026-01-01 10:00:00");
        assert!(created["updatedAt"].is_null());
        let id = created["id"].as_i64().unwrap();

        let resp = send(
            &app,
            send_json(Method::PATCH, &format!("/api/keys/{id}"), &json!({ "status": "inactive" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let patched = json(resp).await;
        assert_eq!(patched["status"], "inactive");
        assert!(patched["updatedAt"].is_string());

        let resp = send(&app, delete(&format!("/api/keys/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(text(resp).await.is_empty());

        let resp = send(&app, get(&format!("/api/keys/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_returns_keys_in_creation_order() {
        let app = test_app(None);
        let resp = send(&app, get("/api/keys")).await;
        assert_eq!(json(resp).await, json!([]));

        create(&app, "first").await;
        create(&app, "second").await;

        let listed = json(send(&app, get("/api/keys")).await).await;
        let identifiers: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|k| k["keyIdentifier"].as_str().unwrap())
            .collect();
        assert_eq!(identifiers, ["first", "second"]);
    }

    #[tokio::test]
    async fn create_accepts_identifier_alias_and_trims() {
        let app = test_app(None);
        let resp = send(
            &app,
            send_json(Method::POST, "/api/keys", &json!({ "identifier": "  K-1  " })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(json(resp).await["keyIdentifier"], "K-1");
    }

    #[tokio::test]
    async fn create_without_identifier_is_400() {
        let app = test_app(None);
        for body in [json!({}), json!({ "keyIdentifier": "" }), json!({ "keyIdentifier": "   " })] {
            let resp = send(&app, send_json(Method::POST, "/api/keys", &body)).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json(resp).await["error"], "keyIdentifier is required");
        }

        let listed = json(send(&app, get("/api/keys")).await).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn duplicate_identifier_is_409() {
        let app = test_app(None);
        create(&app, "dup").await;

        let resp = send(
            &app,
            send_json(Method::POST, "/api/keys", &json!({ "keyIdentifier": "dup" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert!(json(resp).await["error"].is_string());

        let listed = json(send(&app, get("/api/keys")).await).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let app = test_app(None);
        let req = Request::post("/api/keys")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn missing_content_type_is_400() {
        let app = test_app(None);
        let req = Request::post("/api/keys")
            .body(Body::from(r#"{"keyIdentifier":"x"}"#))
            .unwrap();
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_integer_id_is_400() {
        let app = test_app(None);
        let resp = send(&app, get("/api/keys/abc")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn patch_with_invalid_status_is_400_and_unchanged() {
        let app = test_app(None);
        let id = create(&app, "k").await["id"].as_i64().unwrap();

        for body in [json!({ "status": "paused" }), json!({ "status": "Active" }), json!({})] {
            let resp = send(&app, send_json(Method::PATCH, &format!("/api/keys/{id}"), &body)).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                json(resp).await["error"],
                "A valid status (active/inactive) is required"
            );
        }

        let key = json(send(&app, get(&format!("/api/keys/{id}"))).await).await;
        assert_eq!(key["status"], "active");
        assert!(key["updatedAt"].is_null());
    }

    #[tokio::test]
    async fn patch_unknown_id_is_404_before_validation() {
        let app = test_app(None);
        let resp = send(
            &app,
            send_json(Method::PATCH, "/api/keys/42", &json!({ "status": "bogus" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_replaces_identifier_and_status() {
        let app = test_app(None);
        let id = create(&app, "old").await["id"].as_i64().unwrap();

        let resp = send(
            &app,
            send_json(
                Method::PUT,
                &format!("/api/keys/{id}"),
                &json!({ "keyIdentifier": "new", "status": "inactive" }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let key = json(resp).await;
        assert_eq!(key["keyIdentifier"], "new");
        assert_eq!(key["status"], "inactive");
        assert_eq!(key["createdAt"], "2026-01-01 10:00:00");
    }

    #[tokio::test]
    async fn put_onto_existing_identifier_is_409() {
        let app = test_app(None);
        create(&app, "taken").await;
        let id = create(&app, "mine").await["id"].as_i64().unwrap();

        let resp = send(
            &app,
            send_json(
                Method::PUT,
                &format!("/api/keys/{id}"),
                &json!({ "keyIdentifier": "taken", "status": "active" }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn put_unknown_id_is_404() {
        let app = test_app(None);
        let resp = send(
            &app,
            send_json(
                Method::PUT,
                "/api/keys/7",
                &json!({ "keyIdentifier": "x", "status": "active" }),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_404() {
        let app = test_app(None);
        let resp = send(&app, delete("/api/keys/7")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn api_is_open_by_default_with_sign_in_enabled() {
        let app = test_app(Some(FakeProvider::ok("admin@example.com")));
        let resp = send(&app, get("/api/keys")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_api_requires_session() {
        let app = test_app_with(Some(FakeProvider::ok("admin@example.com")), |name| {
            (name == "KEYRING_PROTECT_API").then(|| "true".to_owned())
        });

        let resp = send(&app, get("/api/keys")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(resp).await["error"], "authentication required");

        let cookie = app.signed_in_cookie().await;
        let resp = send(
            &app,
            with_cookie(get("/api/keys"), &cookie),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
