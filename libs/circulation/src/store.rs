//! Collaborator interfaces.
//!
//! The engine never embeds persistence or the user subsystem; it talks to
//! them through these traits. In-memory implementations live in
//! [`crate::memory`].

use shelfmark_id::{BookKey, LoanId, RequesterId};
use shelfmark_packing::Book;

use crate::{Loan, StoreError};

/// Book records and their `allocated` flags.
pub trait ItemStore: Send {
    /// Reads one book.
    fn get(&self, key: &BookKey) -> Result<Option<Book>, StoreError>;

    /// Sets the `allocated` flag of one book.
    fn set_allocated(&mut self, key: &BookKey, allocated: bool) -> Result<(), StoreError>;

    /// Reads every book.
    fn list_all(&self) -> Result<Vec<Book>, StoreError>;
}

/// Durable loan records.
pub trait LoanStore: Send {
    fn persist(&mut self, loan: &Loan) -> Result<(), StoreError>;

    fn end(&mut self, loan_id: LoanId) -> Result<(), StoreError>;
}

/// The user subsystem.
pub trait RequesterDirectory: Send {
    fn exists(&self, requester: &RequesterId) -> bool;
}
