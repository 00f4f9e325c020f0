use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bproxy::{
    cache::{spawn_sweeper, MetadataCache},
    config::Config,
    origin::OriginClient,
    relay::RangeRelay,
    selection::StreamSelector,
    services::PlaybackService,
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "bproxy")]
#[command(version)]
#[command(about = "DASH/HLS gateway and range relay for a video platform's CDN")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Codec priority, comma separated (e.g. "hevc,avc,av1")
    #[arg(long, value_name = "LIST")]
    codec: Option<String>,

    /// Highest quality to select (e.g. "1080P", "4K")
    #[arg(long, value_name = "QUALITY")]
    quality: Option<String>,

    /// Skip TLS certificate verification for upstream requests
    #[arg(long)]
    insecure: bool,

    /// Ignore HTTP_PROXY / HTTPS_PROXY
    #[arg(long)]
    no_proxy: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("bproxy={},tower_http=trace", cli.log_level)
    } else {
        format!("bproxy={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bproxy v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(codec) = cli.codec {
        config.selection.codec_priority = codec;
    }
    if let Some(quality) = cli.quality {
        config.selection.max_quality = quality;
    }
    if cli.insecure {
        config.origin.insecure = true;
    }
    if cli.no_proxy {
        config.origin.use_env_proxy = false;
    }

    let policy = config.selection.policy();
    info!(
        "Selection policy: codecs={:?} max_quality={}",
        policy.codec_priority, policy.max_quality
    );

    let origin = Arc::new(OriginClient::new(&config.origin)?);
    let relay = RangeRelay::new(&config.origin)?;
    let cache = Arc::new(MetadataCache::with_system_clock());
    let playback = Arc::new(PlaybackService::new(
        cache.clone(),
        origin.clone(),
        origin,
        StreamSelector::new(policy),
        config.cache.ttl,
    ));

    let cancellation_token = CancellationToken::new();
    spawn_shutdown_listener(cancellation_token.clone());

    let state = AppState::new(playback, relay, config.web.public_host.clone());
    let web_server = WebServer::new(&config.web, state)?;

    info!(
        "Starting web server on {}:{}",
        web_server.host(),
        web_server.port()
    );

    let (server_ready_tx, server_ready_rx) = tokio::sync::oneshot::channel();
    let server_token = cancellation_token.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = web_server
            .serve_with_cancellation(server_ready_tx, server_token)
            .await
        {
            error!("Web server failed: {}", e);
        }
    });

    match server_ready_rx.await {
        Ok(Ok(())) => {
            info!("Web server is now listening, starting background services...");
        }
        Ok(Err(bind_error)) => {
            error!("Failed to bind web server: {}", bind_error);
            return Err(bind_error);
        }
        Err(_) => {
            error!("Web server task completed without signaling");
            return Err(anyhow::anyhow!("Web server failed to start"));
        }
    }

    let sweeper_handle = spawn_sweeper(
        cache,
        config.cache.sweep_interval,
        cancellation_token.clone(),
    );

    server_handle.await?;
    cancellation_token.cancel();
    sweeper_handle.await?;

    info!("Shutdown complete");
    Ok(())
}

/// Cancel `token` on SIGTERM or SIGINT (Ctrl+C where unix signals are unavailable)
fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        error!("Failed to install signal handlers: {}", e);
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT (Ctrl+C), shutting down gracefully");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                return;
            }
            info!("Received Ctrl+C, shutting down gracefully");
        }

        token.cancel();
    });
}
