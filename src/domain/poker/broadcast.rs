//! Outbound broadcast envelope.
//!
//! Wire format (JSON):
//!
//! ```text
//! { "type": "GET_USERS", "data": [{"uuid": "1", "username": "alice", "voting": 5}], "timestamp": "2024-03-01T12:30:00Z" }
//! { "type": "REVEAL_VOTINGS", "data": null, "timestamp": "2024-03-01T12:30:01Z" }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::user::User;

/// Event types delivered to session subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BroadcastType {
    GetUsers,
    UpdateUsers,
    RevealVotings,
    NoSessionFound,
}

impl BroadcastType {
    /// Wire name of the broadcast.
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastType::GetUsers => "GET_USERS",
            BroadcastType::UpdateUsers => "UPDATE_USERS",
            BroadcastType::RevealVotings => "REVEAL_VOTINGS",
            BroadcastType::NoSessionFound => "NO_SESSION_FOUND",
        }
    }
}

impl std::fmt::Display for BroadcastType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a broadcast: nothing, or the session's participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BroadcastPayload {
    /// Serialized as `null`.
    None,
    /// Serialized as an array of users.
    Users(Vec<User>),
}

/// Event published to every participant of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    #[serde(rename = "type")]
    pub kind: BroadcastType,
    pub data: BroadcastPayload,
    pub timestamp: Timestamp,
}

impl Broadcast {
    /// A broadcast carrying the participant list.
    pub fn users(kind: BroadcastType, users: Vec<User>) -> Self {
        Self {
            kind,
            data: BroadcastPayload::Users(users),
            timestamp: Timestamp::now(),
        }
    }

    /// Signals that all participants have voted.
    pub fn reveal_votings() -> Self {
        Self::empty(BroadcastType::RevealVotings)
    }

    /// Signals that the session is missing or unreadable.
    pub fn no_session_found() -> Self {
        Self::empty(BroadcastType::NoSessionFound)
    }

    fn empty(kind: BroadcastType) -> Self {
        Self {
            kind,
            data: BroadcastPayload::None,
            timestamp: Timestamp::now(),
        }
    }

    /// Participants carried by this broadcast, if any.
    pub fn user_list(&self) -> Option<&[User]> {
        match &self.data {
            BroadcastPayload::Users(users) => Some(users),
            BroadcastPayload::None => None,
        }
    }

    /// Encode as a message body.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from a message body.
    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn users_broadcast_serializes_array() {
        let broadcast = Broadcast::users(
            BroadcastType::GetUsers,
            vec![User::new("1", "a").with_voting(5)],
        );
        let value: Value = serde_json::from_slice(&broadcast.encode().unwrap()).unwrap();

        assert_eq!(value["type"], "GET_USERS");
        assert_eq!(value["data"][0]["uuid"], "1");
        assert_eq!(value["data"][0]["voting"], 5);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn empty_payload_serializes_null() {
        let value: Value =
            serde_json::from_slice(&Broadcast::no_session_found().encode().unwrap()).unwrap();
        assert_eq!(value["type"], "NO_SESSION_FOUND");
        assert!(value["data"].is_null());
    }

    #[test]
    fn empty_user_list_stays_an_array() {
        let broadcast = Broadcast::users(BroadcastType::UpdateUsers, vec![]);
        let value: Value = serde_json::from_slice(&broadcast.encode().unwrap()).unwrap();
        assert_eq!(value["data"], Value::Array(vec![]));
    }

    #[test]
    fn decode_distinguishes_payload_variants() {
        let reveal = Broadcast::decode(&Broadcast::reveal_votings().encode().unwrap()).unwrap();
        assert_eq!(reveal.kind, BroadcastType::RevealVotings);
        assert_eq!(reveal.data, BroadcastPayload::None);

        let users = Broadcast::users(BroadcastType::GetUsers, vec![User::new("1", "a")]);
        let decoded = Broadcast::decode(&users.encode().unwrap()).unwrap();
        assert_eq!(decoded.user_list(), Some(&[User::new("1", "a")][..]));
    }
}
