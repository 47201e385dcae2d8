//! Health endpoint.
//!
//! `GET /health` is exempt from the API key gate by default so load
//! balancers and health checkers can reach it.

use axum::extract::State;
use chrono::Utc;
use tracing::instrument;

use crate::models::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// Health check endpoint.
///
/// # Response Body
///
/// ```json
/// {
///   "success": true,
///   "timestamp": 1705315800000,
///   "data": {
///     "status": "healthy",
///     "version": "0.1.0",
///     "timestamp": "2024-01-15T10:30:00Z",
///     "uptimeSeconds": 3600
///   }
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.uptime_seconds(),
    })
}
