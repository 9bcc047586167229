//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Store Ports
//!
//! - `SessionStore` - Session/participant operations used by the dispatcher
//! - `SessionRepository` - Versioned whole-session persistence with CAS
//!
//! ## Transport Ports
//!
//! - `CommandSource` - Inbound command messages
//! - `BroadcastPublisher` - Outbound per-session broadcasts

mod broadcast_publisher;
mod command_source;
mod session_repository;
mod session_store;

pub use broadcast_publisher::{BroadcastPublisher, PublishError};
pub use command_source::CommandSource;
pub use session_repository::{CasOutcome, SessionRepository, Versioned};
pub use session_store::{SessionStore, StoreError};
