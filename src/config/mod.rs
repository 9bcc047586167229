//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ANNAPOKER` prefix and nested values use double underscores as separators.
//! Every value has a local development default, so an empty environment yields
//! a processor talking to `redis://localhost:6379`.
//!
//! # Example
//!
//! ```no_run
//! use annapoker::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Consuming commands from {}", config.broker.command_channel);
//! ```

mod broker;
mod dispatcher;
mod error;
mod logging;
mod redis;
mod store;

pub use broker::BrokerConfig;
pub use dispatcher::{DispatcherConfig, MAX_SHARDS};
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use redis::RedisConfig;
pub use store::{StoreBackend, StoreConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Redis connection backing the session store
    #[serde(default)]
    pub redis: RedisConfig,

    /// Pub/sub broker for commands and broadcasts
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Session store behavior
    #[serde(default)]
    pub store: StoreConfig,

    /// Dispatcher sharding
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ANNAPOKER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ANNAPOKER__BROKER__COMMAND_CHANNEL=poker.cmd` -> `broker.command_channel = "poker.cmd"`
    /// - `ANNAPOKER__STORE__BACKEND=memory` -> `store.backend = Memory`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ANNAPOKER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.store.backend == StoreBackend::Redis {
            self.redis.validate()?;
        }
        self.broker.validate()?;
        self.store.validate()?;
        self.dispatcher.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "ANNAPOKER__REDIS__URL",
        "ANNAPOKER__BROKER__COMMAND_CHANNEL",
        "ANNAPOKER__BROKER__BROADCAST_PREFIX",
        "ANNAPOKER__BROKER__USERNAME",
        "ANNAPOKER__BROKER__PASSWORD",
        "ANNAPOKER__STORE__BACKEND",
        "ANNAPOKER__STORE__MAX_ATTEMPTS",
        "ANNAPOKER__DISPATCHER__SHARDS",
        "ANNAPOKER__LOGGING__JSON",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.redis.url, "redis://localhost:6379");
        assert_eq!(config.broker.command_channel, "annapoker.command");
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert_eq!(config.dispatcher.shards, 1);
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ANNAPOKER__REDIS__URL", "redis://cache:6380");
        env::set_var("ANNAPOKER__BROKER__COMMAND_CHANNEL", "poker.cmd");
        env::set_var("ANNAPOKER__BROKER__BROADCAST_PREFIX", "poker.bc");
        env::set_var("ANNAPOKER__BROKER__USERNAME", "poker");
        env::set_var("ANNAPOKER__BROKER__PASSWORD", "s3cret");
        env::set_var("ANNAPOKER__STORE__BACKEND", "memory");
        env::set_var("ANNAPOKER__STORE__MAX_ATTEMPTS", "9");
        env::set_var("ANNAPOKER__DISPATCHER__SHARDS", "4");
        env::set_var("ANNAPOKER__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.redis.url, "redis://cache:6380");
        assert_eq!(config.broker.command_channel, "poker.cmd");
        assert_eq!(config.broker.broadcast_prefix, "poker.bc");
        assert_eq!(config.broker.username.as_deref(), Some("poker"));
        assert_eq!(
            config.broker.password.as_ref().map(|p| p.expose_secret().as_str()),
            Some("s3cret")
        );
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.max_attempts, 9);
        assert_eq!(config.dispatcher.shards, 4);
        assert!(config.dispatcher.is_sharded());
        assert!(config.logging.json);
    }

    #[test]
    fn test_memory_backend_skips_redis_validation() {
        let config = AppConfig {
            redis: RedisConfig {
                url: String::new(),
                ..Default::default()
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_broker_errors() {
        let config = AppConfig {
            broker: BrokerConfig {
                url: "http://broker".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidRedisUrl("broker.url"))
        );
    }
}
