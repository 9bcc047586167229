//! BroadcastEmitter - publishes typed broadcasts to per-session topics.
//!
//! Delivery is fire-and-forget: a failed publish is logged and dropped, and
//! never undoes the store mutation that produced it.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{ErrorCode, SessionId};
use crate::domain::poker::Broadcast;
use crate::ports::BroadcastPublisher;

/// Default bound for a single publish call.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(1);

/// Serializes broadcasts and hands them to the transport.
#[derive(Clone)]
pub struct BroadcastEmitter {
    publisher: Arc<dyn BroadcastPublisher>,
    base_topic: String,
    publish_timeout: Duration,
}

impl BroadcastEmitter {
    /// Create an emitter publishing under `base_topic`.
    pub fn new(publisher: Arc<dyn BroadcastPublisher>, base_topic: impl Into<String>) -> Self {
        Self {
            publisher,
            base_topic: base_topic.into(),
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    /// Set the bound for a single publish call.
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Topic that subscribers of `session_id` listen on.
    pub fn topic_for(&self, session_id: &SessionId) -> String {
        format!("{}.{}", self.base_topic, session_id)
    }

    /// Publish a broadcast to the session's topic.
    ///
    /// Returns whether the transport accepted it. Failures are logged here;
    /// callers are free to ignore the result.
    pub async fn emit(&self, session_id: &SessionId, broadcast: &Broadcast) -> bool {
        let topic = self.topic_for(session_id);

        let payload = match broadcast.encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    topic = %topic,
                    broadcast = %broadcast.kind,
                    error_code = %ErrorCode::SerializationFailed,
                    "Could not encode broadcast: {}", e
                );
                return false;
            }
        };

        let sent =
            tokio::time::timeout(self.publish_timeout, self.publisher.send(&topic, payload)).await;

        match sent {
            Ok(Ok(())) => {
                tracing::info!(topic = %topic, broadcast = %broadcast.kind, "<<< sent broadcast");
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    topic = %topic,
                    broadcast = %broadcast.kind,
                    error_code = %e.code(),
                    "Could not send broadcast: {}", e
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    topic = %topic,
                    broadcast = %broadcast.kind,
                    error_code = %ErrorCode::PublishFailed,
                    timeout_ms = self.publish_timeout.as_millis() as u64,
                    "Broadcast publish timed out"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for BroadcastEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastEmitter")
            .field("base_topic", &self.base_topic)
            .field("publish_timeout", &self.publish_timeout)
            .finish_non_exhaustive()
    }
}
