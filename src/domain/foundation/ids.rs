//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Identifier of a poker session.
///
/// Chosen by clients (it doubles as the routing key of the session's
/// broadcast topic), so it is an opaque string rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new SessionId, returning error if empty or not usable in a topic name.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("session_id"));
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::invalid_format(
                "session_id",
                "must not contain whitespace or control characters",
            ));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl FromStr for SessionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_accepts_plain_string() {
        let id = SessionId::new("abc").unwrap();
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn session_id_rejects_empty_string() {
        let result = SessionId::new("");
        match result {
            Err(ValidationError::EmptyField { field }) => assert_eq!(field, "session_id"),
            _ => panic!("Expected EmptyField error"),
        }
    }

    #[test]
    fn session_id_rejects_whitespace() {
        assert!(SessionId::new("   ").is_err());
        assert!(SessionId::new("a b").is_err());
        assert!(SessionId::new("a\nb").is_err());
    }

    #[test]
    fn session_id_parses_from_str() {
        let id: SessionId = "room-42".parse().unwrap();
        assert_eq!(format!("{}", id), "room-42");
    }

    #[test]
    fn session_id_serializes_as_plain_string() {
        let id = SessionId::new("abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }

    #[test]
    fn session_id_deserialization_validates() {
        let ok: Result<SessionId, _> = serde_json::from_str("\"abc\"");
        assert_eq!(ok.unwrap().as_str(), "abc");

        let empty: Result<SessionId, _> = serde_json::from_str("\"\"");
        assert!(empty.is_err());
    }
}
