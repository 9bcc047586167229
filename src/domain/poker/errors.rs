//! Poker-specific error types.

use thiserror::Error;

use crate::domain::foundation::ErrorCode;

/// Errors raised by mutations of the [`Session`](super::Session) aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No participant with this uuid is part of the session.
    #[error("User not found in session: {uuid}")]
    UserNotFound { uuid: String },
}

impl SessionError {
    pub fn user_not_found(uuid: impl Into<String>) -> Self {
        SessionError::UserNotFound { uuid: uuid.into() }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::UserNotFound { .. } => ErrorCode::UserNotFound,
        }
    }
}

/// Errors raised while decoding an inbound command message.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The message body is not a valid command envelope.
    #[error("Malformed command: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl CommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CommandError::Malformed(_) => ErrorCode::MalformedCommand,
        }
    }
}
