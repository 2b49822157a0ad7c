//! # shelfmark-id
//!
//! Typed identifiers for the shelfmark circulation engine.
//!
//! ## Kinds of identifier
//!
//! - **Book keys** are supplied by the catalogue (usually an ISBN). They are
//!   validated strings, ordered lexicographically, and immutable once issued.
//! - **Requester and loan IDs** are system-generated, prefixed ULIDs:
//!   `usr_01HV4Z2WQXKJNM8GPQY6VBKC3D`, `loan_01HV4Z3MXNKPQR9HSTZ7WCLD4E`.
//! - **Shelf IDs** are ordinals assigned by a packer, local to one arrangement.
//! - **Event IDs and aggregate sequences** order the event journal.
//!
//! Typed IDs keep a loan ID from ever being passed where a requester ID is
//! expected.

mod error;
#[doc(hidden)]
pub mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Raw ULIDs, for callers that build IDs with `from_ulid`.
pub use ulid::Ulid;
