//! HTTP response mapping
//!
//! Error bodies are plain text: players and scripts show them verbatim.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::errors::{AppError, OriginError, OriginStage};

pub const DASH_CONTENT_TYPE: &str = "application/dash+xml";
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
pub const MANIFEST_CACHE_CONTROL: &str = "public, max-age=300";

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            // rejected locally, before any upstream call
            AppError::Origin {
                source: OriginError::InvalidId { .. },
                ..
            } => StatusCode::BAD_REQUEST,
            AppError::Origin {
                source: OriginError::NoDash,
                ..
            } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Origin {
                stage: OriginStage::PlayUrl,
                ..
            } => StatusCode::BAD_REQUEST,
            AppError::Origin {
                stage: OriginStage::VideoInfo,
                ..
            } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NoVideoStream { .. }
            | AppError::Render { .. }
            | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> String {
        match self {
            // reported bare, without the stage prefix
            AppError::Origin {
                source: OriginError::NoDash,
                ..
            } => OriginError::NoDash.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }
        (
            status,
            [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
            self.body(),
        )
            .into_response()
    }
}

/// MPD body with its content type and a five minute cache lifetime
pub fn dash_response(mpd: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, DASH_CONTENT_TYPE),
            (header::CACHE_CONTROL, MANIFEST_CACHE_CONTROL),
        ],
        mpd,
    )
        .into_response()
}

/// Playlist body offered as a download named `{id}.m3u8`
pub fn playlist_response(id: &str, playlist: String) -> Response {
    let mut response = (
        [(header::CONTENT_TYPE, PLAYLIST_CONTENT_TYPE)],
        playlist,
    )
        .into_response();

    let disposition = format!("attachment; filename=\"{}.m3u8\"", attachment_stem(id));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

fn attachment_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() {
                '_'
            } else {
                c
            }
        })
        .collect()
}
