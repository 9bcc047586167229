//! Application layer - command processing.
//!
//! Orchestrates the session store and the broadcast transport:
//! - `CommandDispatcher` - sequential receive loop applying commands
//! - `ShardedDispatcher` - per-session partitioning across dispatcher tasks
//! - `BroadcastEmitter` - fire-and-forget publishing to session topics
//! - `ProcessorContext` - shared handles built once at startup

mod context;
mod dispatcher;
mod emitter;
mod sharding;

pub use context::ProcessorContext;
pub use dispatcher::{CommandDispatcher, DispatchOutcome, DispatchStats};
pub use emitter::{BroadcastEmitter, DEFAULT_PUBLISH_TIMEOUT};
pub use sharding::{shard_for, ShardedDispatcher, DEFAULT_SHARD_BUFFER};
