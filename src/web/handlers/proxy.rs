//! Media relay handler

use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{header, HeaderMap, Response},
};

use crate::web::AppState;

/// `GET /v1/proxy?url={encoded}`
///
/// A missing `url` parameter is relayed as an empty URL and fails like any
/// other unusable upstream.
pub async fn relay(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response<Body> {
    let upstream = query
        .as_deref()
        .and_then(upstream_url)
        .unwrap_or_default();

    state
        .relay
        .relay(&upstream, headers.get(header::RANGE))
        .await
}

fn upstream_url(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}
