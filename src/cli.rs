//! Command-line interface parsing for the contribution calendar server
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a validated [`ServerConfig`].

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cache::FileCache;
use crate::data::contributions::DEFAULT_TIMEOUT;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// No cache file was given and no default location could be determined
    #[error("Cannot determine a cache location; pass --cache-file")]
    NoCacheLocation,

    /// The upstream timeout must be positive
    #[error("Invalid timeout: must be at least 1 second")]
    InvalidTimeout,
}

/// gitcal - Serve a GitHub user's contribution calendar as JSON
#[derive(Parser, Debug)]
#[command(name = "gitcal")]
#[command(about = "HTTP server for GitHub contribution calendars")]
#[command(version)]
pub struct Cli {
    /// Port number to run the server on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Cache expiration time in days
    #[arg(long, value_name = "DAYS", default_value_t = 3)]
    pub cache: u64,

    /// Address to bind the server to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Location of the cache file (defaults to the user cache directory)
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Upstream request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,
}

/// Configuration derived from CLI arguments for server startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub addr: SocketAddr,
    /// Cache expiration in days
    pub cache_days: u64,
    /// Cache file location
    pub cache_file: PathBuf,
    /// Optional log file
    pub log_file: Option<PathBuf>,
    /// Upstream request timeout
    pub timeout: Duration,
}

impl ServerConfig {
    /// Creates a ServerConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ServerConfig)` with defaults filled in
    /// * `Err(CliError)` if the arguments cannot be turned into a usable configuration
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let cache_file = match &cli.cache_file {
            Some(path) => path.clone(),
            None => FileCache::default_path().ok_or(CliError::NoCacheLocation)?,
        };

        if cli.timeout == 0 {
            return Err(CliError::InvalidTimeout);
        }

        Ok(ServerConfig {
            addr: SocketAddr::new(cli.host, cli.port),
            cache_days: cli.cache,
            cache_file,
            log_file: cli.log_file.clone(),
            timeout: Duration::from_secs(cli.timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args_uses_defaults() {
        let cli = Cli::parse_from(["gitcal"]);
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.cache, 3);
        assert_eq!(cli.host.to_string(), "0.0.0.0");
        assert_eq!(cli.timeout, 30);
        assert_eq!(Duration::from_secs(cli.timeout), DEFAULT_TIMEOUT);
        assert!(cli.cache_file.is_none());
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn test_cli_parse_port_and_cache() {
        let cli = Cli::parse_from(["gitcal", "--port", "9000", "--cache", "7"]);
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.cache, 7);
    }

    #[test]
    fn test_cli_rejects_non_numeric_port() {
        assert!(Cli::try_parse_from(["gitcal", "--port", "http"]).is_err());
    }

    #[test]
    fn test_cli_rejects_negative_cache_days() {
        assert!(Cli::try_parse_from(["gitcal", "--cache", "-1"]).is_err());
    }

    #[test]
    fn test_server_config_from_cli_with_cache_file() {
        let cli = Cli::parse_from([
            "gitcal",
            "--host",
            "127.0.0.1",
            "--port",
            "8181",
            "--cache-file",
            "/tmp/gitcal/data.json",
            "--log-file",
            "server.log",
        ]);
        let config = ServerConfig::from_cli(&cli).unwrap();

        assert_eq!(config.addr, "127.0.0.1:8181".parse::<SocketAddr>().unwrap());
        assert_eq!(config.cache_days, 3);
        assert_eq!(config.cache_file, PathBuf::from("/tmp/gitcal/data.json"));
        assert_eq!(config.log_file, Some(PathBuf::from("server.log")));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_server_config_zero_timeout_is_invalid() {
        let cli = Cli::parse_from(["gitcal", "--cache-file", "data.json", "--timeout", "0"]);
        let result = ServerConfig::from_cli(&cli);
        assert!(matches!(result, Err(CliError::InvalidTimeout)));
    }

    #[test]
    fn test_server_config_default_cache_file() {
        let cli = Cli::parse_from(["gitcal"]);
        match ServerConfig::from_cli(&cli) {
            Ok(config) => assert!(config.cache_file.ends_with("data.json")),
            // No home directory in some CI environments
            Err(e) => assert!(matches!(e, CliError::NoCacheLocation)),
        }
    }
}
