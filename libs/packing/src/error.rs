//! Packing errors.

use shelfmark_id::BookKey;
use thiserror::Error;

/// Errors returned by the packers.
///
/// An over-capacity book is not an error: it is placed on its own shelf
/// and flagged through [`crate::Shelf::over_capacity`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackingError {
    /// Capacity was zero, negative, NaN or infinite.
    #[error("invalid shelf capacity: {0}")]
    InvalidCapacity(f64),

    /// A book's weight was negative or not finite.
    #[error("book {key} has invalid weight {weight}")]
    InvalidWeight { key: BookKey, weight: f64 },

    /// A book's value was negative or not finite.
    #[error("book {key} has invalid value {value}")]
    InvalidValue { key: BookKey, value: f64 },

    /// Exhaustive search was asked to handle more books than allowed.
    #[error("exact packing supports at most {limit} books, got {count}")]
    TooManyItems { count: usize, limit: usize },

    /// A strategy name that is neither `greedy` nor `exact`.
    #[error("unknown packing strategy: {0}")]
    UnknownStrategy(String),
}

impl PackingError {
    /// Returns true if the error was caused by the input books or capacity.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCapacity(_) | Self::InvalidWeight { .. } | Self::InvalidValue { .. }
        )
    }
}

/// Validates a shelf capacity.
pub(crate) fn check_capacity(capacity: f64) -> Result<(), PackingError> {
    if capacity.is_finite() && capacity > 0.0 {
        Ok(())
    } else {
        Err(PackingError::InvalidCapacity(capacity))
    }
}
