use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_previewer::{
    config::{Config, ConfigSource},
    services::{FallbackOriginClient, ImageCache, ImageCacheStore, PreviewService},
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "image-previewer")]
#[command(version)]
#[command(about = "A caching image resizing proxy")]
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

    /// Cache directory (overrides config file)
    #[arg(long, value_name = "DIR")]
    cache_path: Option<String>,

    /// Maximum number of cached previews (overrides config file)
    #[arg(long, value_name = "ENTRIES")]
    capacity: Option<usize>,

    /// Log level (overrides config file)
    #[arg(short = 'v', long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_source) = Config::load_from_file(&cli.config)?;

    // Override config with CLI arguments
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(cache_path) = cli.cache_path {
        config.cache.path = cache_path;
    }
    if let Some(capacity) = cli.capacity {
        config.cache.capacity = capacity;
    }
    if let Some(log_level) = cli.log_level {
        config.logging.level = log_level;
    }

    // Initialize logging with the configured level, RUST_LOG wins
    let log_filter = format!(
        "image_previewer={level},tower_http={level}",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting image previewer v{}", env!("CARGO_PKG_VERSION"));
    match config_source {
        ConfigSource::CreatedDefault => info!("Created default config file: {}", cli.config),
        ConfigSource::File => info!("Configuration loaded from: {}", cli.config),
    }

    config.validate().context("Invalid configuration")?;

    let cache = Arc::new(ImageCacheStore::new(
        config.cache.path(),
        config.cache.capacity()?,
        config.image.jpeg_quality,
    ));
    // A cache directory that cannot be created or listed is fatal
    cache
        .load()
        .await
        .with_context(|| format!("Failed to load image cache from {}", config.cache.path))?;

    let origin = Arc::new(
        FallbackOriginClient::new(
            config.origin.connect_timeout()?,
            config.origin.request_timeout()?,
        )
        .context("Failed to build origin HTTP client")?,
    );

    let preview_service = Arc::new(PreviewService::new(
        cache,
        origin,
        config.image.jpeg_quality,
        config.image.max_dimension,
    )?);

    let web_server = WebServer::new(&config, AppState::new(preview_service))?;
    info!("Starting web server on {}:{}", config.web.host, config.web.port);

    let shutdown_token = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown_signal(shutdown_token.clone()));

    // Create a channel to signal when the server is ready or fails to bind
    let (server_ready_tx, server_ready_rx) = tokio::sync::oneshot::channel();

    let server_handle = tokio::spawn(async move {
        web_server
            .serve_with_cancellation(server_ready_tx, shutdown_token)
            .await
    });

    // Wait for the server bind result (success or failure)
    match server_ready_rx.await {
        Ok(Ok(addr)) => {
            info!("Web server is now listening on {}", addr);
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

    server_handle.await??;
    info!("Image previewer stopped");

    Ok(())
}

/// Cancel `token` on SIGTERM or SIGINT
async fn cancel_on_shutdown_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully");
                    }
                    _ = sigint.recv() => {
                        info!("Received SIGINT (Ctrl+C), shutting down gracefully");
                    }
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to install signal handlers, falling back to Ctrl+C: {}", e);
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                info!("Received Ctrl+C, shutting down gracefully");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, shutting down gracefully");
    }

    token.cancel();
}
