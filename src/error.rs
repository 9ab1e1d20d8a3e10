// src/error.rs
//! Request-path error taxonomy and its HTTP mapping.
//!
//! Two classes only: bad client input (400) and a remote collaborator we
//! could not absorb (502). Everything recoverable (ranking failure, lookup
//! ambiguity) is handled inside the pipeline and never reaches this type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Client sent input that failed validation (e.g. no usable phrases
    /// after normalization). Not retried, surfaced immediately.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A mandatory remote collaborator failed and no fallback policy could
    /// absorb it (e.g. the first-pass generation call).
    #[error("dependency failure: {0}")]
    Dependency(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Dependency(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "ok": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
