//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use logfind_core::{ErrorKind, LogError};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for handler and server operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to HTTP clients or raised while serving.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// Malformed request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No line matches the requested timestamp.
    #[error("no log entry for timestamp {0}")]
    NotFound(String),

    /// Global request budget exhausted.
    #[error("rate limit exceeded: {0} requests per second")]
    RateLimited(u32),

    /// The engine has been shut down.
    #[error("service is shutting down")]
    Unavailable,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Maps an engine error for the lookup of `timestamp`.
    #[must_use]
    pub fn from_lookup(err: LogError, timestamp: &str) -> Self {
        if matches!(err, LogError::Closed) {
            return Self::Unavailable;
        }
        match err.kind() {
            ErrorKind::InvalidFormat => Self::InvalidRequest(err.to_string()),
            ErrorKind::NotFound => Self::NotFound(timestamp.to_string()),
            ErrorKind::Io | ErrorKind::Internal => Self::Internal(err.to_string()),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Self::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            Self::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            Self::BindFailed(_, _) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"error":"internal_error","message":"failed to serialize error"}"#.to_string()
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}
