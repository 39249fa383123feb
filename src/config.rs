//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{ExpirationMode, HandleConfiguration};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the cache handle
    pub cache_name: String,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Expiration applied to entries that don't ask for their own
    pub expiration_mode: ExpirationMode,
    /// Default expiration timeout in seconds
    pub expiration_timeout: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Retry budget for updates
    pub max_retries: u32,
    /// Whether handle statistics are collected
    pub enable_statistics: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_NAME` - Handle name (default: "default")
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `EXPIRATION_MODE` - none, sliding, absolute or default (default: absolute)
    /// - `EXPIRATION_TIMEOUT` - Default timeout in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `MAX_RETRIES` - Update retry budget (default: 50)
    /// - `ENABLE_STATISTICS` - true or false (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_name: env::var("CACHE_NAME").unwrap_or(defaults.cache_name),
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            expiration_mode: parse_var("EXPIRATION_MODE").unwrap_or(defaults.expiration_mode),
            expiration_timeout: parse_var("EXPIRATION_TIMEOUT")
                .unwrap_or(defaults.expiration_timeout),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            max_retries: parse_var("MAX_RETRIES").unwrap_or(defaults.max_retries),
            enable_statistics: parse_var("ENABLE_STATISTICS")
                .unwrap_or(defaults.enable_statistics),
        }
    }

    /// Builds the immutable handle configuration.
    pub fn handle_configuration(&self) -> HandleConfiguration {
        HandleConfiguration::new(self.cache_name.clone())
            .with_expiration(
                self.expiration_mode,
                Duration::from_secs(self.expiration_timeout),
            )
            .with_statistics(self.enable_statistics)
            .with_max_retries(self.max_retries)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_name: "default".to_string(),
            max_entries: 1000,
            expiration_mode: ExpirationMode::Absolute,
            expiration_timeout: 300,
            server_port: 3000,
            cleanup_interval: 1,
            max_retries: HandleConfiguration::DEFAULT_MAX_RETRIES,
            enable_statistics: true,
        }
    }
}
