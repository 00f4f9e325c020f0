//! Playlist handler

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::web::{responses::playlist_response, AppState, PublicOrigin};

/// `GET /v1/video/{id}`: extended M3U with one entry per part
pub async fn playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    origin: PublicOrigin,
) -> Response {
    match state
        .playback
        .playlist(&id, origin.scheme, &origin.host)
        .await
    {
        Ok(playlist) => playlist_response(&id, playlist),
        Err(e) => e.into_response(),
    }
}
