//! Session aggregate entity.
//!
//! A session is one voting round: an ordered list of participants and their
//! current votes. Existence of the persisted session is the only notion of
//! "active"; expiry is left to the store.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, Timestamp};

use super::errors::SessionError;
use super::user::{User, PENDING_VOTE};
use super::voting;

/// Session aggregate - participants of a single estimation round.
///
/// # Invariants
///
/// - `users` contains at most one entry per `uuid`
/// - `users` keeps join order; removal does not reorder the remaining entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    id: SessionId,

    /// Participants in join order.
    #[serde(default)]
    users: Vec<User>,

    /// When the session was created.
    created_at: Timestamp,

    /// When the session was last mutated.
    updated_at: Timestamp,
}

/// How [`Session::add_user`] applied the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// A new participant was appended.
    Joined,
    /// A participant with the same uuid was replaced in place.
    Replaced,
}

impl Session {
    /// Create a new session without participants.
    pub fn new(id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            users: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the participants in join order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Consumes the session, returning its participants.
    pub fn into_users(self) -> Vec<User> {
        self.users
    }

    /// Looks up a participant by uuid.
    pub fn user(&self, uuid: &str) -> Option<&User> {
        self.users.iter().find(|u| u.uuid == uuid)
    }

    /// Number of participants that still have to vote.
    pub fn pending_votings(&self) -> usize {
        voting::pending_count(&self.users)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a participant, replacing any existing entry with the same uuid.
    pub fn add_user(&mut self, user: User) -> Membership {
        let outcome = match self.users.iter_mut().find(|u| u.uuid == user.uuid) {
            Some(existing) => {
                *existing = user;
                Membership::Replaced
            }
            None => {
                self.users.push(user);
                Membership::Joined
            }
        };
        self.touch();
        outcome
    }

    /// Remove the participant with the given uuid.
    ///
    /// Returns the removed participant, or `None` if nobody matched (in which
    /// case the session is left untouched).
    pub fn remove_user(&mut self, uuid: &str) -> Option<User> {
        let index = self.users.iter().position(|u| u.uuid == uuid)?;
        let removed = self.users.remove(index);
        self.touch();
        Some(removed)
    }

    /// Record a vote. Only `voting` changes; the username is kept.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no participant has this uuid
    pub fn update_voting(&mut self, uuid: &str, value: u32) -> Result<(), SessionError> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.uuid == uuid)
            .ok_or_else(|| SessionError::user_not_found(uuid))?;
        user.voting = value;
        self.touch();
        Ok(())
    }

    /// Clear every participant's vote.
    pub fn reset_votings(&mut self) {
        for user in &mut self.users {
            user.voting = PENDING_VOTE;
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
