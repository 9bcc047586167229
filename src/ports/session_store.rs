//! SessionStore port - data access for poker sessions.
//!
//! The dispatcher only ever talks to this contract. Every operation is a
//! read-modify-write over the whole session value; implementations decide how
//! concurrent writers are kept from losing each other's updates.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ErrorCode, SessionId};
use crate::domain::poker::User;

/// Errors returned by session store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The session does not exist (never created, or expired).
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session exists but has no participant with this uuid.
    #[error("User {uuid} not found in session {session_id}")]
    UserNotFound { session_id: SessionId, uuid: String },

    /// Transport failure talking to the backing store.
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be encoded or decoded.
    #[error("Session serialization failed: {0}")]
    Serialization(String),

    /// The backing store did not answer within the configured bound.
    #[error("Session store call timed out after {0:?}")]
    Timeout(Duration),

    /// Optimistic write kept losing to concurrent writers.
    #[error("Write conflict on session {session_id} after {attempts} attempts")]
    Conflict { session_id: SessionId, attempts: u32 },
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            StoreError::UserNotFound { .. } => ErrorCode::UserNotFound,
            StoreError::Unavailable(_) => ErrorCode::StoreUnavailable,
            StoreError::Serialization(_) => ErrorCode::SerializationFailed,
            StoreError::Timeout(_) => ErrorCode::StoreTimeout,
            StoreError::Conflict { .. } => ErrorCode::WriteConflict,
        }
    }

    /// True for the recoverable "session or user absent" outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::SessionNotFound(_) | StoreError::UserNotFound { .. }
        )
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Port for reading and mutating poker sessions.
///
/// Implementations must ensure:
/// - A mutation against a missing session fails with `SessionNotFound` and
///   writes nothing
/// - A mutation is either fully applied or not applied at all
/// - Participants stay unique by `uuid`
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create an empty session, overwriting any session with the same id.
    async fn insert_session(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Add a participant; an existing participant with the same uuid is replaced.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    async fn add_user_to_session(&self, id: &SessionId, user: &User) -> Result<(), StoreError>;

    /// Remove the participant matching `user.uuid`. Removing an absent
    /// participant succeeds without changes.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    async fn remove_user_from_session(&self, id: &SessionId, user: &User)
        -> Result<(), StoreError>;

    /// Participants in join order.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    async fn get_users(&self, id: &SessionId) -> Result<Vec<User>, StoreError>;

    /// Replace the vote of the participant matching `user.uuid`.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    /// - `UserNotFound` if no participant has that uuid
    async fn update_user(&self, id: &SessionId, user: &User) -> Result<(), StoreError>;

    /// Clear every participant's vote.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    async fn reset_votings(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Number of participants that have not voted.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    async fn count_pending_votings(&self, id: &SessionId) -> Result<usize, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn session_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn SessionStore) {}
    }

    #[test]
    fn not_found_errors_are_recoverable() {
        let id = SessionId::new("abc").unwrap();
        assert!(StoreError::SessionNotFound(id.clone()).is_not_found());
        assert!(StoreError::UserNotFound {
            session_id: id,
            uuid: "1".to_string()
        }
        .is_not_found());
        assert!(!StoreError::Unavailable("down".to_string()).is_not_found());
    }

    #[test]
    fn error_codes_map_variants() {
        assert_eq!(
            StoreError::Timeout(Duration::from_millis(10)).code(),
            ErrorCode::StoreTimeout
        );
        assert_eq!(
            StoreError::Serialization("bad".to_string()).code(),
            ErrorCode::SerializationFailed
        );
    }
}
