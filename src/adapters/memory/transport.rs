//! In-memory message transport for tests and local runs.
//!
//! - `ChannelCommandSource` feeds raw command bodies from a tokio channel
//! - `InMemoryBroadcastPublisher` captures every published payload

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::poker::{Broadcast, BroadcastType};
use crate::ports::{BroadcastPublisher, CommandSource, PublishError};

/// Command source backed by a tokio mpsc channel.
pub struct ChannelCommandSource {
    receiver: mpsc::Receiver<Vec<u8>>,
}

impl ChannelCommandSource {
    /// Create a bounded channel and the source reading from it.
    pub fn channel(capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { receiver: rx })
    }
}

#[async_trait]
impl CommandSource for ChannelCommandSource {
    async fn receive(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }
}

/// One captured publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Broadcast publisher that records payloads instead of sending them.
///
/// # Example
///
/// ```ignore
/// let publisher = Arc::new(InMemoryBroadcastPublisher::new());
/// // ... run the dispatcher ...
/// assert_eq!(publisher.broadcast_types(), vec![BroadcastType::GetUsers]);
/// ```
#[derive(Default)]
pub struct InMemoryBroadcastPublisher {
    published: Mutex<Vec<PublishedMessage>>,
    failing: AtomicBool,
}

impl InMemoryBroadcastPublisher {
    /// Creates a publisher with nothing captured.
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Makes `send` fail while set (nothing is captured).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All captured messages in publish order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.lock().clone()
    }

    /// Captured messages decoded as broadcasts, paired with their topic.
    ///
    /// Payloads that are not broadcasts are skipped.
    pub fn broadcasts(&self) -> Vec<(String, Broadcast)> {
        self.lock()
            .iter()
            .filter_map(|m| {
                Broadcast::decode(&m.payload)
                    .ok()
                    .map(|b| (m.topic.clone(), b))
            })
            .collect()
    }

    /// Types of all captured broadcasts in publish order.
    pub fn broadcast_types(&self) -> Vec<BroadcastType> {
        self.broadcasts().into_iter().map(|(_, b)| b.kind).collect()
    }

    /// Number of captured messages.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Clears captured messages (for test isolation).
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PublishedMessage>> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BroadcastPublisher for InMemoryBroadcastPublisher {
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Unavailable(
                "in-memory publisher marked failing".to_string(),
            ));
        }
        self.lock().push(PublishedMessage {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }
}
