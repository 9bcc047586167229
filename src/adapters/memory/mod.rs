//! In-memory adapters.
//!
//! Deterministic, dependency-free implementations of the store and
//! transport ports for tests and local development.

mod session_repository;
mod transport;

pub use session_repository::InMemorySessionRepository;
pub use transport::{ChannelCommandSource, InMemoryBroadcastPublisher, PublishedMessage};
