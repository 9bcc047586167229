//! Inbound command envelope.
//!
//! Wire format (JSON):
//!
//! ```text
//! { "cmd": "SAVE_USER", "user": "alice", "data": {"uuid": "1", "username": "alice", "voting": 0}, "sessionId": "abc" }
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::foundation::SessionId;

use super::errors::CommandError;
use super::user::User;

/// The instruction carried by a command.
///
/// Unrecognized `cmd` strings decode as [`CommandKind::Unknown`] so the
/// dispatcher can ignore them without treating the message as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    CreateSession,
    SaveUser,
    GetUsers,
    UpdateVoting,
    ResetVotings,
    RemoveUser,
    #[serde(other)]
    Unknown,
}

impl CommandKind {
    /// Wire name of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CreateSession => "CREATE_SESSION",
            CommandKind::SaveUser => "SAVE_USER",
            CommandKind::GetUsers => "GET_USERS",
            CommandKind::UpdateVoting => "UPDATE_VOTING",
            CommandKind::ResetVotings => "RESET_VOTINGS",
            CommandKind::RemoveUser => "REMOVE_USER",
            CommandKind::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound request to mutate or query session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub cmd: CommandKind,

    /// Display name of the sender.
    #[serde(rename = "user", default, deserialize_with = "null_as_default")]
    pub username: String,

    /// Participant the command refers to (SAVE_USER, UPDATE_VOTING, REMOVE_USER).
    #[serde(rename = "data", default, deserialize_with = "null_as_default")]
    pub user: User,

    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
}

impl Command {
    /// Build a command in code (tests, tooling).
    pub fn new(cmd: CommandKind, session_id: SessionId) -> Self {
        Self {
            cmd,
            username: String::new(),
            user: User::default(),
            session_id,
        }
    }

    /// Attach the referenced participant.
    pub fn with_user(mut self, user: User) -> Self {
        self.username = user.username.clone();
        self.user = user;
        self
    }

    /// Decode a command from a raw message body.
    ///
    /// # Errors
    ///
    /// - `Malformed` if the body is not a valid command envelope
    pub fn decode(body: &[u8]) -> Result<Self, CommandError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Encode the command as a message body.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_envelope() {
        let body = br#"{"cmd":"SAVE_USER","user":"alice","data":{"uuid":"1","username":"alice","voting":0},"sessionId":"abc"}"#;
        let cmd = Command::decode(body).unwrap();
        assert_eq!(cmd.cmd, CommandKind::SaveUser);
        assert_eq!(cmd.username, "alice");
        assert_eq!(cmd.user, User::new("1", "alice"));
        assert_eq!(cmd.session_id.as_str(), "abc");
    }

    #[test]
    fn missing_or_null_data_defaults_to_empty_user() {
        let missing = Command::decode(br#"{"cmd":"GET_USERS","sessionId":"abc"}"#).unwrap();
        assert_eq!(missing.user, User::default());

        let null = Command::decode(br#"{"cmd":"GET_USERS","user":null,"data":null,"sessionId":"abc"}"#)
            .unwrap();
        assert_eq!(null.user, User::default());
        assert_eq!(null.username, "");
    }

    #[test]
    fn unrecognized_cmd_decodes_as_unknown() {
        let cmd = Command::decode(br#"{"cmd":"SHUFFLE_DECK","sessionId":"abc"}"#).unwrap();
        assert_eq!(cmd.cmd, CommandKind::Unknown);
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = Command::decode(b"not json").unwrap_err();
        assert!(matches!(err, CommandError::Malformed(_)));
    }

    #[test]
    fn empty_session_id_is_malformed() {
        assert!(Command::decode(br#"{"cmd":"GET_USERS","sessionId":""}"#).is_err());
    }

    #[test]
    fn missing_session_id_is_malformed() {
        assert!(Command::decode(br#"{"cmd":"GET_USERS"}"#).is_err());
    }

    #[test]
    fn negative_vote_is_malformed() {
        let body = br#"{"cmd":"UPDATE_VOTING","data":{"uuid":"1","voting":-1},"sessionId":"abc"}"#;
        assert!(Command::decode(body).is_err());
    }

    #[test]
    fn encode_uses_wire_field_names() {
        let cmd = Command::new(CommandKind::UpdateVoting, SessionId::new("abc").unwrap())
            .with_user(User::new("1", "alice").with_voting(5));
        let value: serde_json::Value = serde_json::from_slice(&cmd.encode().unwrap()).unwrap();
        assert_eq!(value["cmd"], "UPDATE_VOTING");
        assert_eq!(value["sessionId"], "abc");
        assert_eq!(value["user"], "alice");
        assert_eq!(value["data"]["voting"], 5);
    }
}
