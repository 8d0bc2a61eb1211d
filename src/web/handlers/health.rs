//! Health check HTTP handlers

use axum::{extract::State, response::Response};

use crate::web::{
    AppState,
    responses::{HealthResponse, ok},
};

/// Liveness plus cache counters
pub async fn health_check(State(state): State<AppState>) -> Response {
    let uptime = chrono::Utc::now() - state.started_at;

    ok(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds(),
        cache: state.preview.cache_stats().await,
    })
}
