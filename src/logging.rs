//! Log output setup
//!
//! Logs go to stderr, and optionally to a plain-text file as well. The
//! level defaults to `info` and can be overridden with `RUST_LOG`.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "info";

/// Errors that can occur when installing the log subscriber
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The log file could not be opened
    #[error("Failed to open log file: {0}")]
    File(#[from] std::io::Error),

    /// A global subscriber was already installed
    #[error("Failed to install log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Builds the level filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Opens `path` for appending, creating it if needed
fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber
///
/// # Arguments
/// * `log_file` - Optional file receiving a copy of every log line
pub fn init(log_file: Option<&Path>) -> Result<(), LoggingError> {
    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;

    Ok(())
}
