// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types: sync failures and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure of a single reconciliation, enrichment or disconnect operation.
///
/// None of these are retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("No linked account")]
    NoAccount,

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Failed to decode workout summaries: {0}")]
    DecodeFailed(String),

    #[error("Failed to parse workout detail: {0}")]
    ParseFailed(String),

    #[error("Store commit failed: {0}")]
    StoreCommitFailed(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Workout not found: {0}")]
    NotFound(i64),
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("No linked account")]
    NoAccount,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NoAccount => AppError::NoAccount,
            SyncError::NotFound(id) => AppError::NotFound(format!("Workout {}", id)),
            SyncError::InvalidUrl(_)
            | SyncError::FetchFailed(_)
            | SyncError::DecodeFailed(_)
            | SyncError::ParseFailed(_) => AppError::Upstream(err.to_string()),
            SyncError::StoreCommitFailed(_) | SyncError::Store(_) => {
                AppError::Database(err.to_string())
            }
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NoAccount => (StatusCode::CONFLICT, "no_account", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream API error");
                (StatusCode::BAD_GATEWAY, "upstream_error", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
