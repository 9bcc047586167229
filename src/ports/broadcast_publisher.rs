//! BroadcastPublisher port - outbound side of the message transport.
//!
//! The domain only needs to hand a serialized payload to a named topic; the
//! broker binding (Redis pub/sub, in-memory for tests) lives in adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ErrorCode;

/// Failure to hand a broadcast to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Broadcast could not be encoded: {0}")]
    Encoding(String),
}

impl PublishError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PublishError::Unavailable(_) => ErrorCode::PublishFailed,
            PublishError::Encoding(_) => ErrorCode::SerializationFailed,
        }
    }
}

/// Port for publishing broadcast payloads.
///
/// Delivery is fire-and-forget: callers log failures and move on.
///
/// # Example
///
/// ```ignore
/// publisher.send("annapoker.broadcast.abc", payload).await?;
/// ```
#[async_trait]
pub trait BroadcastPublisher: Send + Sync {
    /// Publish one payload to a topic.
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}
