//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid Redis URL format for {0}")]
    InvalidRedisUrl(&'static str),

    #[error("Timeout must be greater than zero: {0}")]
    InvalidTimeout(&'static str),

    #[error("Channel name must not contain whitespace: {0}")]
    InvalidChannel(&'static str),

    #[error("Store retry budget must be at least 1")]
    InvalidRetryBudget,

    #[error("Shard count must be between 1 and {max}")]
    InvalidShardCount { max: usize },

    #[error("Shard buffer must be at least 1")]
    InvalidShardBuffer,
}
