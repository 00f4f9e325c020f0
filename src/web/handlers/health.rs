//! Health check handler

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::web::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Entries physically held by the metadata cache, expired ones included
    pub cached_titles: usize,
    pub uptime_seconds: i64,
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cached_titles: state.playback.cache().len().await,
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}
