//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        ErrorCode::ValidationFailed
    }
}

/// Error codes organized by category.
///
/// Attached to log records as the `error_code` field so failures can be
/// grouped without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    MalformedCommand,

    // Not found errors
    SessionNotFound,
    UserNotFound,

    // Infrastructure errors
    StoreUnavailable,
    StoreTimeout,
    WriteConflict,
    SerializationFailed,
    PublishFailed,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::MalformedCommand => "MALFORMED_COMMAND",
            ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::StoreTimeout => "STORE_TIMEOUT",
            ErrorCode::WriteConflict => "WRITE_CONFLICT",
            ErrorCode::SerializationFailed => "SERIALIZATION_FAILED",
            ErrorCode::PublishFailed => "PUBLISH_FAILED",
        };
        write!(f, "{}", s)
    }
}
