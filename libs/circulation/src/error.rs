//! Circulation errors.

use serde::Serialize;
use shelfmark_id::{BookKey, LoanId, RequesterId};
use shelfmark_packing::PackingError;
use thiserror::Error;

/// Errors reported by the collaborator stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached (or its lock was poisoned).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused a write.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// A record the engine expected to exist was missing.
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Broad classification of a [`CirculationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownItem,
    UnknownLoan,
    UnknownRequester,
    SameItemReplacement,
    ItemOnLoan,
    AlreadyHolding,
    Store,
    Packing,
    InvariantViolation,
}

/// Errors returned by the circulation engine.
///
/// A create on an allocated book is not an error; it yields
/// [`crate::AllocationOutcome::Queued`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CirculationError {
    #[error("unknown book: {0}")]
    UnknownItem(BookKey),

    #[error("unknown loan: {0}")]
    UnknownLoan(LoanId),

    #[error("unknown requester: {0}")]
    UnknownRequester(RequesterId),

    #[error("replacement book {0} is the book already on loan")]
    SameItemReplacement(BookKey),

    #[error("book {0} is on loan")]
    ItemOnLoan(BookKey),

    /// The requester asked for a book they already hold.
    #[error("requester {requester} already holds book {book}")]
    AlreadyHolding {
        requester: RequesterId,
        book: BookKey,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Packing(#[from] PackingError),

    /// Engine state disagreed with itself.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl CirculationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownItem(_) => ErrorKind::UnknownItem,
            Self::UnknownLoan(_) => ErrorKind::UnknownLoan,
            Self::UnknownRequester(_) => ErrorKind::UnknownRequester,
            Self::SameItemReplacement(_) => ErrorKind::SameItemReplacement,
            Self::ItemOnLoan(_) => ErrorKind::ItemOnLoan,
            Self::AlreadyHolding { .. } => ErrorKind::AlreadyHolding,
            Self::Store(_) => ErrorKind::Store,
            Self::Packing(_) => ErrorKind::Packing,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
        }
    }

    /// Returns true if the caller can fix the request and retry.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnknownItem
                | ErrorKind::UnknownLoan
                | ErrorKind::UnknownRequester
                | ErrorKind::SameItemReplacement
                | ErrorKind::ItemOnLoan
                | ErrorKind::AlreadyHolding
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors() {
        let key = BookKey::parse("B1").unwrap();
        assert!(CirculationError::UnknownItem(key.clone()).is_caller_error());
        assert!(CirculationError::SameItemReplacement(key).is_caller_error());
        assert!(CirculationError::UnknownLoan(LoanId::new()).is_caller_error());

        let holding = CirculationError::AlreadyHolding {
            requester: RequesterId::new(),
            book: BookKey::parse("B2").unwrap(),
        };
        assert_eq!(holding.kind(), ErrorKind::AlreadyHolding);
        assert!(holding.is_caller_error());
    }

    #[test]
    fn test_internal_errors() {
        let store: CirculationError = StoreError::Unavailable("down".into()).into();
        assert_eq!(store.kind(), ErrorKind::Store);
        assert!(!store.is_caller_error());
        assert_eq!(store.to_string(), "store unavailable: down");

        let violation = CirculationError::InvariantViolation("index out of sync".into());
        assert!(!violation.is_caller_error());
    }

    #[test]
    fn test_packing_error_converts() {
        let err: CirculationError = PackingError::InvalidCapacity(0.0).into();
        assert_eq!(err.kind(), ErrorKind::Packing);
    }
}
