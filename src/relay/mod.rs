//! Range-preserving media relay
//!
//! Players cannot send the identification headers the CDN insists on, so media
//! requests come here instead. The relay adds those headers, forwards the
//! player's `Range` verbatim and streams the upstream answer back untouched.
//! Nothing is cached or retried.

use axum::{
    body::Body,
    http::{
        header::{self, HeaderName, HeaderValue},
        Response, StatusCode,
    },
};
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, error, warn};

use crate::config::OriginConfig;
use crate::errors::OriginResult;
use crate::origin::build_http_client;

#[derive(Clone)]
pub struct RangeRelay {
    client: Client,
}

impl RangeRelay {
    /// Relay client with the configured upstream headers and connect timeout,
    /// and no total timeout.
    pub fn new(config: &OriginConfig) -> OriginResult<Self> {
        Ok(Self::from_client(build_http_client(config, None)?))
    }

    /// Use a prepared client; it must already carry the upstream headers
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Forward one GET. Any outbound failure, including an empty or unparsable
    /// URL, yields a bare 500.
    pub async fn relay(&self, url: &str, range: Option<&HeaderValue>) -> Response<Body> {
        if url.is_empty() {
            warn!("Relay request without upstream url");
        }

        let mut request = self.client.get(url);
        if let Some(range) = range {
            request = request.header(header::RANGE, range.clone());
        }

        let upstream = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Relay to upstream failed: {}", e);
                return failure_response();
            }
        };

        let status = upstream.status();
        debug!(
            "Relaying upstream status={} range={:?} content_length={:?}",
            status,
            range,
            upstream.content_length()
        );

        let mut builder = Response::builder().status(status);
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in upstream.headers() {
                if !is_hop_by_hop(name) {
                    headers.append(name.clone(), value.clone());
                }
            }
        }

        // owned by the response body: a player hanging up drops the upstream connection
        let body = upstream.bytes_stream().inspect(|chunk| {
            if let Err(e) = chunk {
                warn!("Upstream body ended with error: {}", e);
            }
        });

        match builder.body(Body::from_stream(body)) {
            Ok(response) => response,
            Err(e) => {
                error!("Failed building relay response: {}", e);
                failure_response()
            }
        }
    }
}

/// Headers scoped to the upstream connection; the local server does its own framing
fn is_hop_by_hop(name: &HeaderName) -> bool {
    *name == header::CONNECTION
        || *name == header::TRANSFER_ENCODING
        || name.as_str() == "keep-alive"
}

fn failure_response() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_by_hop_detection() {
        assert!(is_hop_by_hop(&header::CONNECTION));
        assert!(is_hop_by_hop(&HeaderName::from_static("keep-alive")));
        assert!(is_hop_by_hop(&header::TRANSFER_ENCODING));
        assert!(!is_hop_by_hop(&header::CONTENT_RANGE));
        assert!(!is_hop_by_hop(&header::CONTENT_LENGTH));
    }

    #[tokio::test]
    async fn test_unparsable_url_is_a_bare_500() {
        let relay = RangeRelay::new(&OriginConfig::default()).unwrap();
        for url in ["", "not a url", "ftp//missing-colon"] {
            let response = relay.relay(url, None).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert!(body.is_empty());
        }
    }
}
