//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps store, digest and validation errors to HTTP status codes and the
//! stable kind tags clients match on. Storage and internal failures are
//! logged in full but reach the client only as a generic message.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use evl_core::ValidationError;
use evl_crypto::DigestError;
use evl_ledger::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable kind tag (e.g. "NOT_FOUND", "WRITE_CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Evidence item or version does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request carried a missing or invalid field (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// The uploaded content stream failed mid-read (422).
    #[error("I/O failure: {0}")]
    Io(String),

    /// Another appender took the version; retries exhausted (409).
    #[error("write conflict: {0}")]
    WriteConflict(String),

    /// Upload exceeded the configured body limit (413).
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Ledger failure. Message is logged but not returned to client (500).
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal server error. Message is logged but not returned to client (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Io(_) => (StatusCode::UNPROCESSABLE_ENTITY, "IO_FAILURE"),
            Self::WriteConflict(_) => (StatusCode::CONFLICT, "WRITE_CONFLICT"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Machine-readable kind tag.
    pub fn code(&self) -> &'static str {
        self.status_and_code().1
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Storage(_) => "A storage error occurred".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Storage(_) => tracing::error!(error = %self, "storage failure"),
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::WriteConflict(_) => tracing::warn!(error = %self, "append retries exhausted"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err.kind() {
            "NOT_FOUND" => Self::NotFound(err.to_string()),
            "WRITE_CONFLICT" => Self::WriteConflict(err.to_string()),
            "VALIDATION_ERROR" => Self::Validation(err.to_string()),
            _ => Self::Storage(err.to_string()),
        }
    }
}

impl From<DigestError> for AppError {
    fn from(err: DigestError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::Io(err.body_text())
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {err}"))
    }
}
