//! Session store configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where session state lives
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    /// Process-local map; state is lost on restart
    Memory,
}

/// Session store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Prefix for session keys
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Expiry of an idle session, refreshed on every write
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Attempts per mutation before a write conflict is reported
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Bound for a single store call, in milliseconds
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl StoreConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    /// Validate store configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key_prefix.is_empty() {
            return Err(ValidationError::MissingRequired("store.key_prefix"));
        }
        if self.session_ttl_secs == 0 {
            return Err(ValidationError::InvalidTimeout("store.session_ttl_secs"));
        }
        if self.op_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("store.op_timeout_ms"));
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidRetryBudget);
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            key_prefix: default_key_prefix(),
            session_ttl_secs: default_session_ttl(),
            max_attempts: default_max_attempts(),
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

fn default_key_prefix() -> String {
    "annapoker:session:".to_string()
}

fn default_session_ttl() -> u64 {
    4 * 60 * 60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_op_timeout_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Redis);
        assert_eq!(config.session_ttl(), Duration::from_secs(14_400));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.op_timeout(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = StoreConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRetryBudget));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = StoreConfig {
            session_ttl_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
