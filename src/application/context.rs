//! Shared handles wired together at startup.

use std::sync::Arc;
use std::time::Duration;

use crate::ports::{BroadcastPublisher, SessionStore};

use super::emitter::{BroadcastEmitter, DEFAULT_PUBLISH_TIMEOUT};

/// Everything a dispatcher needs, constructed once by the bootstrap and
/// passed by reference into each dispatcher.
#[derive(Clone)]
pub struct ProcessorContext {
    pub store: Arc<dyn SessionStore>,
    pub publisher: Arc<dyn BroadcastPublisher>,
    pub broadcast_prefix: String,
    pub publish_timeout: Duration,
}

impl ProcessorContext {
    pub fn new(
        store: Arc<dyn SessionStore>,
        publisher: Arc<dyn BroadcastPublisher>,
        broadcast_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            publisher,
            broadcast_prefix: broadcast_prefix.into(),
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Emitter publishing through this context's transport.
    pub fn emitter(&self) -> BroadcastEmitter {
        BroadcastEmitter::new(Arc::clone(&self.publisher), self.broadcast_prefix.clone())
            .with_publish_timeout(self.publish_timeout)
    }
}

impl std::fmt::Debug for ProcessorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorContext")
            .field("broadcast_prefix", &self.broadcast_prefix)
            .field("publish_timeout", &self.publish_timeout)
            .finish_non_exhaustive()
    }
}
