//! OpenAPI document for the key API, served at `/api/doc.json`.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Build the docs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/doc.json", get(openapi))
}

async fn openapi() -> Json<Value> {
    Json(openapi_document())
}

fn openapi_document() -> Value {
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "description": "The ID of the key.",
        "schema": { "type": "integer", "format": "int64" }
    });
    let key_response = |description: &str| {
        json!({
            "description": description,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Key" } } }
        })
    };
    let error_response = |description: &str| {
        json!({
            "description": description,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Error" } } }
        })
    };

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Keyring API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Create, list, update and delete managed keys."
        },
        "tags": [{ "name": "Keys" }],
        "paths": {
            "/api/keys": {
                "get": {
                    "tags": ["Keys"],
                    "summary": "List all keys",
                    "responses": {
                        "200": {
                            "description": "Returns the list of all keys.",
                            "content": { "application/json": { "schema": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Key" }
                            } } }
                        }
                    }
                },
                "post": {
                    "tags": ["Keys"],
                    "summary": "Create a key",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": {
                            "type": "object",
                            "required": ["keyIdentifier"],
                            "properties": {
                                "keyIdentifier": { "type": "string", "example": "A1-B2-C3-D4", "maxLength": 255 }
                            }
                        } } }
                    },
                    "responses": {
                        "201": key_response("Key created successfully."),
                        "400": error_response("Bad request, invalid input."),
                        "409": error_response("A key with this identifier already exists.")
                    }
                }
            },
            "/api/keys/{id}": {
                "parameters": [id_param],
                "get": {
                    "tags": ["Keys"],
                    "summary": "Get a key",
                    "responses": {
                        "200": key_response("Returns the requested key."),
                        "404": error_response("Key not found.")
                    }
                },
                "patch": {
                    "tags": ["Keys"],
                    "summary": "Set the status of a key",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": {
                            "type": "object",
                            "required": ["status"],
                            "properties": { "status": { "$ref": "#/components/schemas/Status" } }
                        } } }
                    },
                    "responses": {
                        "200": key_response("Key updated successfully."),
                        "400": error_response("Bad request, invalid status provided."),
                        "404": error_response("Key not found.")
                    }
                },
                "put": {
                    "tags": ["Keys"],
                    "summary": "Replace the identifier and status of a key",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": {
                            "type": "object",
                            "required": ["keyIdentifier", "status"],
                            "properties": {
                                "keyIdentifier": { "type": "string", "maxLength": 255 },
                                "status": { "$ref": "#/components/schemas/Status" }
                            }
                        } } }
                    },
                    "responses": {
                        "200": key_response("Key updated successfully."),
                        "400": error_response("Bad request, invalid input."),
                        "404": error_response("Key not found."),
                        "409": error_response("A key with this identifier already exists.")
                    }
                },
                "delete": {
                    "tags": ["Keys"],
                    "summary": "Delete a key",
                    "responses": {
                        "204": { "description": "Key deleted successfully." },
                        "404": error_response("Key not found.")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Status": { "type": "string", "enum": ["active", "inactive"] },
                "Key": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "keyIdentifier": { "type": "string" },
                        "status": { "$ref": "#/components/schemas/Status" },
                        "createdAt": { "type": "string", "example": "2026-01-01 10:00:00" },
                        "updatedAt": { "type": "string", "nullable": true }
                    }
                },
                "Error": {
                    "type": "object",
                    "properties": { "error": { "type": "string" } }
                }
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{get, json, send, test_app};

    #[tokio::test]
    async fn document_describes_key_routes() {
        let app = test_app(None);
        let resp = send(&app, get("/api/doc.json")).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let doc = json(resp).await;
        assert_eq!(doc["openapi"], "3.0.3");
        let item = &doc["paths"]["/api/keys/{id}"];
        for method in ["get", "patch", "put", "delete"] {
            assert!(item[method].is_object(), "missing {method}");
        }
        assert!(doc["paths"]["/api/keys"]["post"]["responses"]["201"].is_object());
    }
}
