//! Request extractors

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::convert::Infallible;

use super::AppState;

/// Scheme and host a client used to reach the gateway, for absolute links.
///
/// Host comes from the `Host` header (or the URI authority on HTTP/2), falling
/// back to the configured public host. Scheme is `https` only when a fronting
/// proxy says so via `X-Forwarded-Proto` or the URI carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicOrigin {
    pub scheme: &'static str,
    pub host: String,
}

impl PublicOrigin {
    pub fn from_parts(parts: &Parts, fallback_host: &str) -> Self {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| fallback_host.to_string());

        let forwarded_https = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"));
        let scheme = if forwarded_https || parts.uri.scheme_str() == Some("https") {
            "https"
        } else {
            "http"
        };

        Self { scheme, host }
    }
}

impl FromRequestParts<AppState> for PublicOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts, &state.public_host))
    }
}
