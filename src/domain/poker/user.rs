//! Session participant.

use serde::{Deserialize, Serialize};

/// Voting value meaning "not yet voted" (or cleared by a reset).
pub const PENDING_VOTE: u32 = 0;

/// A participant of a poker session.
///
/// `uuid` identifies the participant within a session; `username` is only
/// for display. `voting` is unsigned, so a negative estimate cannot be
/// represented and is rejected when the command is decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub uuid: String,
    pub username: String,
    pub voting: u32,
}

impl User {
    /// Creates a participant that has not voted yet.
    pub fn new(uuid: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            username: username.into(),
            voting: PENDING_VOTE,
        }
    }

    /// Returns a copy carrying the given vote.
    pub fn with_voting(mut self, voting: u32) -> Self {
        self.voting = voting;
        self
    }

    /// True once the participant has cast a vote.
    pub fn has_voted(&self) -> bool {
        self.voting != PENDING_VOTE
    }
}
