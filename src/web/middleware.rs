//! HTTP middleware

use axum::{
    extract::Request,
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::manifest::RELAY_PATH;

/// Request logging middleware
///
/// Each request runs inside an `http_request` span with a generated id, so the
/// origin and relay logs it causes can be traced back to it. Relay requests are
/// logged by path only: their query is a signed media URL, and players issue
/// many of them per title, so their completion is logged at debug.
pub async fn request_logging_middleware(
    method: Method,
    uri: Uri,
    request: Request,
    next: Next,
) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let is_relay = uri.path() == RELAY_PATH;
    let target = if is_relay {
        uri.path().to_string()
    } else {
        uri.to_string()
    };
    let span = info_span!("http_request", %request_id, %method, uri = %target);

    async move {
        let start = Instant::now();
        debug!("HTTP request started");

        let response = next.run(request).await;
        // relay bodies keep streaming after this point; duration covers time to headers
        log_completion(response.status(), start.elapsed().as_millis(), is_relay);
        response
    }
    .instrument(span)
    .await
}

fn log_completion(status: StatusCode, duration_ms: u128, is_relay: bool) {
    let status = status.as_u16();
    if status >= 400 {
        warn!(status, duration_ms, "HTTP request completed with error");
    } else if is_relay {
        debug!(status, duration_ms, "HTTP request completed");
    } else {
        info!(status, duration_ms, "HTTP request completed");
    }
}
