//! Session repository port (versioned persistence).
//!
//! Lower-level contract underneath [`SessionStore`](super::SessionStore):
//! whole-value load and write of a [`Session`], where every stored value
//! carries a version token and writes can be made conditional on it.
//!
//! # Design
//!
//! - **Optimistic concurrency**: `compare_and_swap` only writes when the
//!   stored version still equals the one that was read
//! - **Monotonic versions**: every successful write (including `put`)
//!   yields a version different from all versions handed out before it

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::poker::Session;

use super::StoreError;

/// A value together with the version token it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write happened; carries the new version.
    Applied(u64),
    /// Another writer got there first; nothing was written.
    Conflict,
    /// The session disappeared (expired) since it was read.
    Missing,
}

/// Repository port for versioned session persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Load a session and its current version.
    ///
    /// Returns `None` if not found.
    async fn load(&self, id: &SessionId) -> Result<Option<Versioned<Session>>, StoreError>;

    /// Write a session unconditionally, creating or overwriting it.
    ///
    /// Returns the new version.
    async fn put(&self, session: &Session) -> Result<u64, StoreError>;

    /// Write a session only if its stored version equals `expected_version`.
    async fn compare_and_swap(
        &self,
        expected_version: u64,
        session: &Session,
    ) -> Result<CasOutcome, StoreError>;
}
