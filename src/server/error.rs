//! Mapping from pipeline errors to JSON HTTP responses

use crate::error::MergeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Error returned by handlers
#[derive(Debug)]
pub enum ApiError {
    /// 400, body `{ "error": ... }`
    BadRequest(String),
    /// 401, body `{ "code": 401, "message": ... }`
    Unauthorized(String),
    /// 500, body `{ "error": ... }`
    Internal(String),
}

impl From<MergeError> for ApiError {
    fn from(err: MergeError) -> Self {
        if err.is_client_error() {
            tracing::warn!(error = %err, "rejected request");
        } else {
            tracing::error!(error = %err, "request failed");
        }

        match err {
            MergeError::Validation(msg) => Self::BadRequest(msg),
            MergeError::Auth(msg) => Self::Unauthorized(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
            Self::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "code": 401, "message": msg })),
            )
                .into_response(),
            Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
        }
    }
}
