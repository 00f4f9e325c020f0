//! DASH manifest handler

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::web::{responses::dash_response, AppState};

#[derive(Debug, Deserialize)]
pub struct PlayParams {
    /// 1-based part number, kept raw so bad input can be echoed back
    pub p: Option<String>,
}

/// `GET /v1/play/{id}?p={n}`: MPD for one part
pub async fn manifest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PlayParams>,
    headers: HeaderMap,
) -> Response {
    info!(
        id = %id,
        p = params.p.as_deref().unwrap_or_default(),
        user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default(),
        "MPD request"
    );

    match state.playback.play(&id, params.p.as_deref()).await {
        Ok(mpd) => dash_response(mpd),
        Err(e) => e.into_response(),
    }
}
