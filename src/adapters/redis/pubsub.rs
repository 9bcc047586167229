//! Redis pub/sub message transport.
//!
//! Commands arrive on a single channel; broadcasts go out on one channel per
//! session (`<broadcast_prefix>.<session_id>`), which clients subscribe to.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::ports::{BroadcastPublisher, CommandSource, PublishError};

/// Publishes broadcasts with `PUBLISH`.
#[derive(Clone)]
pub struct RedisBroadcastPublisher {
    conn: MultiplexedConnection,
}

impl RedisBroadcastPublisher {
    /// Create a new publisher over a shared connection.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Check broker connectivity.
    pub async fn ping(&self) -> Result<(), PublishError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl BroadcastPublisher for RedisBroadcastPublisher {
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(topic, payload)
            .await
            .map_err(|e: redis::RedisError| PublishError::Unavailable(e.to_string()))
    }
}

impl std::fmt::Debug for RedisBroadcastPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroadcastPublisher").finish_non_exhaustive()
    }
}

/// Receives command messages from a subscribed channel.
///
/// Holds a dedicated connection: a subscribed Redis connection cannot issue
/// regular commands.
pub struct RedisCommandSubscriber {
    channel: String,
    messages: Pin<Box<dyn Stream<Item = redis::Msg> + Send>>,
}

impl RedisCommandSubscriber {
    /// Open a dedicated connection and subscribe to `channel`.
    pub async fn subscribe(
        client: &redis::Client,
        channel: impl Into<String>,
    ) -> Result<Self, redis::RedisError> {
        let channel = channel.into();
        let mut pubsub = client.get_async_connection().await?.into_pubsub();
        pubsub.subscribe(&channel).await?;

        tracing::info!(channel = %channel, "Subscribed to command channel");

        Ok(Self {
            channel,
            messages: Box::pin(pubsub.into_on_message()),
        })
    }

    /// Name of the subscribed channel.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl CommandSource for RedisCommandSubscriber {
    async fn receive(&mut self) -> Option<Vec<u8>> {
        let message = self.messages.next().await;
        if message.is_none() {
            tracing::warn!(channel = %self.channel, "Command subscription closed");
        }
        message.map(|msg| msg.get_payload_bytes().to_vec())
    }
}

impl std::fmt::Debug for RedisCommandSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCommandSubscriber")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
