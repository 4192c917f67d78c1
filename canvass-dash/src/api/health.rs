//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::ingest::{NoticeLevel, SourceKind};
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" while serving sample data
    pub status: String,
    pub module: String,
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Normalized addresses currently loaded
    pub dataset_size: usize,
    /// Most recent loader error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let dataset = state.dataset.read().await;
    let status = match dataset.loaded_from.kind {
        SourceKind::Synthetic => "degraded",
        _ => "ok",
    };
    let last_error = dataset
        .notices
        .iter()
        .rev()
        .find(|n| n.level == NoticeLevel::Error)
        .map(|n| n.message.clone());

    Json(HealthResponse {
        status: status.to_string(),
        module: "canvass-dash".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        dataset_size: dataset.len(),
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
