//! CommandSource port - inbound side of the message transport.

use async_trait::async_trait;

/// Port yielding raw inbound command messages, one at a time.
///
/// Decoding is left to the dispatcher so an undecodable message can be
/// skipped without tearing down the subscription.
#[async_trait]
pub trait CommandSource: Send {
    /// Wait for the next message body.
    ///
    /// Returns `None` once the channel is closed for good.
    async fn receive(&mut self) -> Option<Vec<u8>>;
}
