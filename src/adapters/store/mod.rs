//! SessionStore implementations built on a versioned repository.

mod optimistic;

pub use optimistic::{OptimisticSessionStore, StoreOptions};
