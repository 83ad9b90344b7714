// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed input (authorization code, forecast data, query parameters).
    #[error("Invalid request: {0}")]
    Validation(String),

    /// No usable OAuth tokens; the caller must restart the authorization flow.
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker used by the Google client for HTTP 401 responses.
    pub const UPSTREAM_UNAUTHORIZED: &'static str = "Upstream rejected credentials (401)";

    /// Returns true if an upstream call failed because the access token was rejected.
    pub fn is_upstream_unauthorized(&self) -> bool {
        matches!(self, AppError::Upstream(msg) if msg == Self::UPSTREAM_UNAUTHORIZED)
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
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::NotAuthenticated => {
                (StatusCode::UNAUTHORIZED, "not_authenticated", None)
            }
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream API error");
                (StatusCode::BAD_GATEWAY, "upstream_error", None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
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
