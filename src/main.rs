//! gitcal - Serve a GitHub user's contribution calendar as JSON
//!
//! Starts an HTTP server answering `GET /api?user=<name>` with the user's
//! contribution total and week-bucketed calendar.

use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use gitcal::cache::FileCache;
use gitcal::cli::{Cli, ServerConfig};
use gitcal::data::{CalendarExtractor, ContributionClient};
use gitcal::logging;
use gitcal::server::{self, AppState};

/// Resolves once the process is asked to stop (Ctrl-C)
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Server is shutting down...");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match ServerConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    logging::init(config.log_file.as_deref())?;

    let cache = Arc::new(FileCache::with_path(config.cache_file.clone()));
    let extractor = Arc::new(CalendarExtractor::new()?);
    let client = ContributionClient::new(cache, extractor, config.timeout)?;
    let state = AppState {
        client,
        cache_days: config.cache_days,
    };

    info!(
        cache_file = %config.cache_file.display(),
        cache_days = config.cache_days,
        "Starting server on port {}...",
        config.addr.port()
    );
    let listener = TcpListener::bind(config.addr).await?;
    server::serve(listener, state, shutdown_signal()).await?;

    info!("Server stopped successfully");
    Ok(())
}
