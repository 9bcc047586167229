//! Redis adapters.
//!
//! - `RedisSessionRepository` - versioned session persistence with TTL
//! - `RedisBroadcastPublisher` / `RedisCommandSubscriber` - pub/sub transport

pub mod connection;
mod pubsub;
mod session_repository;

pub use pubsub::{RedisBroadcastPublisher, RedisCommandSubscriber};
pub use session_repository::{RedisSessionRepository, DEFAULT_SESSION_TTL};
