//! API error responses.
//!
//! # Responsibilities
//! - Map domain errors to HTTP status codes
//! - Render every error as `{ "error": code, "message": text }`
//!
//! # Design Decisions
//! - Codes are stable snake_case identifiers; messages are for humans
//! - Server-side failures are logged where they are converted

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::checker::CheckError;
use crate::nginx::GenerateError;
use crate::storage::StorageError;

/// Wire shape of an error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "not_found", e.to_string()),
            StorageError::Conflict(_) => Self::new(StatusCode::CONFLICT, "conflict", e.to_string()),
            StorageError::UnsupportedBackend(_) => {
                tracing::error!(error = %e, "Storage backend error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", e.to_string())
            }
        }
    }
}

impl From<CheckError> for ApiError {
    fn from(e: CheckError) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "check_failed", e.to_string())
    }
}

impl From<GenerateError> for ApiError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::Storage(inner) => inner.into(),
            other => {
                tracing::error!(error = %other, "Configuration generation failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "generate_failed",
                    other.to_string(),
                )
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
