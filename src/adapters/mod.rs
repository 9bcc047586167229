//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `store` - SessionStore built on a versioned repository (optimistic concurrency)
//! - `memory` - In-memory repository and transport (tests, local runs)
//! - `redis` - Redis repository and pub/sub transport (production)

pub mod memory;
pub mod redis;
pub mod store;

pub use memory::{ChannelCommandSource, InMemoryBroadcastPublisher, InMemorySessionRepository};
pub use store::{OptimisticSessionStore, StoreOptions};
