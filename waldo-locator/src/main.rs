//! waldo-locator - Main entry point
//!
//! Resolves place references in news articles into deduplicated map
//! locations, streaming job progress over SSE.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waldo_common::config::TomlConfig;
use waldo_locator::config::ServiceConfig;
use waldo_locator::{build_router, AppState};

/// Command-line arguments for waldo-locator
#[derive(Parser, Debug)]
#[command(name = "waldo-locator")]
#[command(about = "Article location extraction service")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "WALDO_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface to bind (overrides config)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut toml_config =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        toml_config.port = port;
    }
    if let Some(bind) = args.bind {
        toml_config.bind_address = bind;
    }

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting waldo-locator v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );

    let service_config = ServiceConfig::from_toml(&toml_config);
    info!(
        geocoder = %service_config.nominatim_url,
        model = %service_config.gemini_model,
        job_timeout_secs = service_config.job_timeout.as_secs(),
        "Service configured"
    );

    let state = AppState::from_config(service_config).context("Failed to initialize services")?;
    let app = build_router(state);

    let ip: IpAddr = toml_config
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", toml_config.bind_address))?;
    let addr = SocketAddr::new(ip, toml_config.port);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
