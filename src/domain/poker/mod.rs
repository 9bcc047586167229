//! Planning poker domain module.
//!
//! Participants join a session, cast hidden votes, and the votes are
//! revealed once everyone has voted.
//!
//! - `Session` - aggregate holding the participants of one round
//! - `voting` - pure vote-completion rules
//! - `Command` / `Broadcast` - inbound and outbound message envelopes

mod broadcast;
mod command;
mod errors;
mod session;
mod user;
pub mod voting;

pub use broadcast::{Broadcast, BroadcastPayload, BroadcastType};
pub use command::{Command, CommandKind};
pub use errors::{CommandError, SessionError};
pub use session::{Membership, Session};
pub use user::{User, PENDING_VOTE};
