//! Pix Sentinel Server - fraud-signal HTTP service
//!
//! Serves the prediction endpoint and the Prometheus scrape endpoint, and runs
//! the compliance evaluation and metric-freshness simulator in the background.
//!
//! # Usage
//! ```sh
//! PORT=8080 LOG_FORMAT=json cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `PORT` / `BIND_ADDRESS` - HTTP listener (default: 0.0.0.0:8080)
//! - `PUSH_ENABLED` / `PUSH_GATEWAY_URL` - compliance push delivery
//! - `EVAL_INTERVAL_SECONDS` - compliance cycle period (default: 86400)
//! - `SIMULATION_ENABLED` / `SIMULATION_INTERVAL_SECONDS` - metric simulator
//! - `LOG_FORMAT` - `json` or `pretty` (default)

use anyhow::{Context, Result};
use pix_sentinel::application::system::Application;
use pix_sentinel::config::Config;
use pix_sentinel::infrastructure::logging::{LogFormat, init_tracing};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());

    info!("Pix Sentinel Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        "Configuration loaded: Listen={}, Push={} ({}), EvalInterval={}s",
        config.observability.socket_address(),
        config.push.enabled,
        config.push.gateway_url,
        config.compliance.eval_interval_seconds
    );

    let app = Application::build(config.clone()).await?;

    let cancel = CancellationToken::new();
    let handle = app.start(cancel.clone());

    let listener = tokio::net::TcpListener::bind(config.observability.socket_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.observability.socket_address()))?;
    info!("HTTP server listening on {}", listener.local_addr()?);
    info!("Server running. Press Ctrl+C to shutdown.");

    let shutdown = cancel.clone();
    let served = axum::serve(listener, app.router())
        .with_graceful_shutdown(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!("Failed to listen for shutdown signal: {}", e);
                    }
                    info!("Shutdown signal received.");
                }
                _ = shutdown.cancelled() => {}
            }
        })
        .await;

    handle.shutdown().await;
    info!("Background tasks stopped. Exiting...");

    served.context("HTTP server failed")
}
