//! Configuration management for s3mirror
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use s3mirror::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Mirroring {} into {}", config.queue.url, config.download.root.display());
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `S3MIRROR__<section>__<key>`
//!
//! Examples:
//! - `S3MIRROR__QUEUE__URL=https://sqs.eu-west-2.amazonaws.com/123456789012/uploads`
//! - `S3MIRROR__DOWNLOAD__ROOT=/srv/mirror`
//! - `S3MIRROR__HEALTH__BIND_ADDR=0.0.0.0:9100`
//!
//! The unprefixed `SQS_QUEUE_URL`, `DOWNLOAD_PATH`, `AWS_REGION`,
//! `AWS_ENDPOINT_URL`, `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` are also
//! honoured. Credentials are only ever read from the environment.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/s3mirror.toml`.
//! This can be overridden using the `S3MIRROR_CONFIG` environment variable or
//! the `--config` flag.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use models::{
    Config, DownloadConfig, HealthConfig, QueueConfig, StorageConfig, WorkerConfig,
};
pub use validation::ValidationError;

use std::path::PathBuf;
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
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`S3MIRROR__*`, then the unprefixed names)
    /// 2. TOML file (default: `config/s3mirror.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (missing queue URL, out-of-range limits, etc.)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Same as [`Config::load`], with an explicit file taking precedence over
    /// `S3MIRROR_CONFIG`
    pub fn load_with(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
