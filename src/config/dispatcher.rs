//! Dispatcher configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Upper bound on dispatcher shards
pub const MAX_SHARDS: usize = 64;

/// How commands are spread over dispatcher tasks
#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    /// Number of dispatcher tasks; 1 runs the plain sequential loop
    #[serde(default = "default_shards")]
    pub shards: usize,

    /// Queued commands per shard before the router waits
    #[serde(default = "default_shard_buffer")]
    pub shard_buffer: usize,
}

impl DispatcherConfig {
    pub fn is_sharded(&self) -> bool {
        self.shards > 1
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.shards == 0 || self.shards > MAX_SHARDS {
            return Err(ValidationError::InvalidShardCount { max: MAX_SHARDS });
        }
        if self.shard_buffer == 0 {
            return Err(ValidationError::InvalidShardBuffer);
        }
        Ok(())
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            shards: default_shards(),
            shard_buffer: default_shard_buffer(),
        }
    }
}

fn default_shards() -> usize {
    1
}

fn default_shard_buffer() -> usize {
    256
}
