//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (session ids, timestamps, errors)
//! - `poker` - Session aggregate, participants, votes, commands and broadcasts

pub mod foundation;
pub mod poker;
