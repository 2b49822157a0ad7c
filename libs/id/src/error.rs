//! Identifier parse errors.

use thiserror::Error;

/// Errors returned when parsing identifiers or book keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,

    /// A prefixed ID carried another type's prefix, e.g. a loan ID where a
    /// requester ID was expected.
    #[error("expected a '{expected}_' identifier, got prefix '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    #[error("identifier has no '_' between prefix and ULID")]
    MissingSeparator,

    #[error("malformed ULID: {0}")]
    InvalidUlid(String),

    /// A book key that is too long or contains a disallowed character.
    #[error("invalid book key: {reason}")]
    InvalidBookKey { reason: String },
}

impl IdError {
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }

    /// Returns true if the input was an ID of a different kind.
    pub fn is_prefix_error(&self) -> bool {
        matches!(self, IdError::InvalidPrefix { .. })
    }
}
