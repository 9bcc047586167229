//! Message broker configuration (command channel and broadcast topics)

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::redis::{default_url, validate_redis_url};

/// Pub/sub broker the processor consumes commands from and publishes to
#[derive(Debug, Deserialize)]
pub struct BrokerConfig {
    /// Broker connection URL
    #[serde(default = "default_url")]
    pub url: String,

    /// ACL user, if not embedded in the URL
    #[serde(default)]
    pub username: Option<String>,

    /// Password, if not embedded in the URL
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Channel carrying inbound commands
    #[serde(default = "default_command_channel")]
    pub command_channel: String,

    /// Base topic; broadcasts go to `<broadcast_prefix>.<sessionId>`
    #[serde(default = "default_broadcast_prefix")]
    pub broadcast_prefix: String,

    /// Bound for a single publish, in milliseconds
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl BrokerConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate broker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_redis_url(&self.url, "broker.url")?;
        validate_channel(&self.command_channel, "broker.command_channel")?;
        validate_channel(&self.broadcast_prefix, "broker.broadcast_prefix")?;
        if self.publish_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("broker.publish_timeout_ms"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("broker.connect_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            command_channel: default_command_channel(),
            broadcast_prefix: default_broadcast_prefix(),
            publish_timeout_ms: default_publish_timeout_ms(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn validate_channel(name: &str, field: &'static str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::MissingRequired(field));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidChannel(field));
    }
    Ok(())
}

fn default_command_channel() -> String {
    "annapoker.command".to_string()
}

fn default_broadcast_prefix() -> String {
    "annapoker.broadcast".to_string()
}

fn default_publish_timeout_ms() -> u64 {
    1000
}

fn default_connect_timeout() -> u64 {
    5
}
