//! Configuration management for the JLib dashboard
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use jlib_dashboard::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Polling {} every {}", config.upstream.base_url, config.refresh.interval);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `JLIB_DASHBOARD__<section>__<key>`
//!
//! Examples:
//! - `JLIB_DASHBOARD__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `JLIB_DASHBOARD__UPSTREAM__BASE_URL=http://inspector:8080`
//! - `JLIB_DASHBOARD__REFRESH__INTERVAL=30s`
//!
//! `JLIB_SERVER_URL` is honored as a shorthand for the upstream base URL.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/jlib-dashboard.toml`.
//! This can be overridden using the `JLIB_DASHBOARD_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::{ByteSize, HumanDuration};
pub use models::{Config, RefreshConfig, ServerConfig, SubscriberConfig, UpstreamConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value
    /// fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Re-run validation, e.g. after command-line overrides
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }
}
