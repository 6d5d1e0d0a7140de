//! HTTP request handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use logfind_core::{TIMESTAMP_LEN, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query parameters for a timestamp lookup.
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    /// Canonical `YYYY-MM-DDTHH:MM:SS.mmm` timestamp.
    pub timestamp: Option<String>,
}

/// Successful lookup response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogResponse {
    /// The requested timestamp, canonical form.
    pub timestamp: String,
    /// The matching log line.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status message.
    pub status: String,
    /// Number of indexed log files.
    pub files: usize,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Handle GET /health - health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        files: state.service().file_count(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Handle GET /logs?timestamp= - exact timestamp lookup.
pub async fn get_log(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> ApiResult<Json<LogResponse>> {
    let raw = query
        .timestamp
        .ok_or_else(|| ApiError::InvalidRequest("missing timestamp parameter".to_string()))?;

    if raw.len() != TIMESTAMP_LEN {
        return Err(ApiError::InvalidRequest(format!(
            "timestamp must be {TIMESTAMP_LEN} characters (YYYY-MM-DDTHH:MM:SS.mmm)"
        )));
    }
    let timestamp: Timestamp = raw
        .parse()
        .map_err(|e| ApiError::from_lookup(e, &raw))?;

    let service = Arc::clone(state.service());
    let result = tokio::task::spawn_blocking(move || service.find_log(timestamp))
        .await
        .map_err(|e| {
            error!(error = %e, "lookup task failed");
            ApiError::Internal("lookup task failed".to_string())
        })?;

    match result {
        Ok(message) => Ok(Json(LogResponse {
            timestamp: timestamp.format(),
            message,
        })),
        Err(e) if e.is_not_found() => {
            debug!(%timestamp, "no matching line");
            Err(ApiError::from_lookup(e, &raw))
        }
        Err(e) => {
            error!(%timestamp, error = %e, "lookup failed");
            Err(ApiError::from_lookup(e, &raw))
        }
    }
}
