//! Vote completion rules.
//!
//! Pure functions over a participant list; no I/O.

use super::user::User;

/// Number of participants whose vote is still pending.
pub fn pending_count(users: &[User]) -> usize {
    users.iter().filter(|u| !u.has_voted()).count()
}

/// True iff the session has participants and every one of them has voted.
pub fn all_voted(users: &[User]) -> bool {
    should_reveal(pending_count(users), users.len())
}

/// Reveal decision from a committed pending count.
///
/// An empty session never reveals, even though its pending count is zero.
pub fn should_reveal(pending: usize, participants: usize) -> bool {
    participants > 0 && pending == 0
}
