//! Web layer module
//!
//! Thin handlers over [`PlaybackService`] and [`RangeRelay`]:
//! - **Handlers**: one file per route group
//! - **Responses**: error to status mapping and manifest responses
//! - **Extractors**: scheme and host for playlist links
//! - **Middleware**: request logging

use anyhow::Result;
use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::WebConfig;
use crate::manifest::RELAY_PATH;
use crate::relay::RangeRelay;
use crate::services::PlaybackService;

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;

pub use extractors::PublicOrigin;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub playback: Arc<PlaybackService>,
    pub relay: RangeRelay,
    /// Host used in playlist links when the request has none
    pub public_host: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(playback: Arc<PlaybackService>, relay: RangeRelay, public_host: String) -> Self {
        Self {
            playback,
            relay,
            public_host,
            started_at: Utc::now(),
        }
    }
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &WebConfig, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
        Ok(Self {
            app: Self::create_router(state),
            addr,
        })
    }

    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health::health_check))
            .route("/v1/video/{id}", get(handlers::video::playlist))
            .route("/v1/play/{id}", get(handlers::play::manifest))
            .route(RELAY_PATH, get(handlers::proxy::relay))
            .layer(axum::middleware::from_fn(
                middleware::request_logging_middleware,
            ))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Serve until `cancellation_token` fires, then drain in-flight requests.
    ///
    /// `ready_signal` reports whether the listener could be bound.
    pub async fn serve_with_cancellation(
        self,
        ready_signal: oneshot::Sender<Result<()>>,
        cancellation_token: CancellationToken,
    ) -> Result<()> {
        match tokio::net::TcpListener::bind(&self.addr).await {
            Ok(listener) => {
                let _ = ready_signal.send(Ok(()));
                info!("Web server listening on {}", self.addr);

                let shutdown_signal = async move {
                    cancellation_token.cancelled().await;
                    info!("Web server received cancellation signal, shutting down gracefully");
                };

                axum::serve(listener, self.app)
                    .with_graceful_shutdown(shutdown_signal)
                    .await?;
                Ok(())
            }
            Err(bind_error) => {
                let bind_err_msg = format!("Failed to bind to {}: {}", self.addr, bind_error);
                let _ = ready_signal.send(Err(anyhow::anyhow!("{}", bind_err_msg)));
                Err(anyhow::anyhow!("{}", bind_err_msg))
            }
        }
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}
