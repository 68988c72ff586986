//! HTTP error types for the Keyring server.
//!
//! Maps domain errors from `keyring-core` into HTTP responses. The JSON API
//! renders every error as `{"error": "<message>"}`; the form surface renders
//! the same errors as plain text through [`PageError`].

use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use keyring_core::error::{KeyError, UserError};

/// Application-level error returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Client sent invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// No signed-in session.
    #[error("{0}")]
    Unauthorized(String),
    /// Sign-in was refused.
    #[error("{0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// A uniqueness conflict (duplicate identifier).
    #[error("{0}")]
    Conflict(String),
    /// Internal server error. The message is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message safe to show a client.
    fn public_message(&self) -> String {
        match self {
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, axum::Json(body)).into_response()
    }
}

/// An [`AppError`] rendered as plain text, for the form surface.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (self.0.status(), self.0.public_message()).into_response()
    }
}

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<KeyError> for PageError {
    fn from(err: KeyError) -> Self {
        Self(err.into())
    }
}

impl From<PathRejection> for PageError {
    fn from(rejection: PathRejection) -> Self {
        Self(rejection.into())
    }
}

impl From<FormRejection> for PageError {
    fn from(rejection: FormRejection) -> Self {
        Self(rejection.into())
    }
}

impl From<KeyError> for AppError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::Validation { .. } => Self::BadRequest(err.to_string()),
            KeyError::NotFound { .. } => Self::NotFound(err.to_string()),
            KeyError::Conflict { .. } => Self::Conflict(err.to_string()),
            KeyError::Corrupt { .. } | KeyError::Storage(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidEmail { .. } => Self::Forbidden(err.to_string()),
            UserError::Storage(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_errors_map_to_statuses() {
        let cases = [
            (
                KeyError::Validation {
                    reason: "bad".to_owned(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (KeyError::NotFound { id: 1 }, StatusCode::NOT_FOUND),
            (
                KeyError::Conflict {
                    identifier: "x".to_owned(),
                },
                StatusCode::CONFLICT,
            ),
            (
                KeyError::Corrupt {
                    id: 1,
                    reason: "status".to_owned(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn internal_message_is_not_leaked() {
        let err = AppError::Internal("db password wrong".to_owned());
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn page_error_is_plain_text() {
        let resp = PageError(AppError::Conflict("taken".to_owned())).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let content_type = resp.headers().get(axum::http::header::CONTENT_TYPE);
        assert!(content_type.is_some_and(|v| v.as_bytes().starts_with(b"text/plain")));
    }
}
