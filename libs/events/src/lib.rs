//! # shelfmark-events
//!
//! Event definitions for the circulation engine.
//!
//! ## Design Principles
//!
//! - Events are immutable records of transitions the engine has already applied
//! - Every event belongs to exactly one aggregate (a book, or the bookcase)
//! - The engine only journals events; persisting them is the caller's job
//!
//! ## Event Envelope
//!
//! All events share a common envelope with:
//! - Journal ordering (`event_id`)
//! - Aggregate ordering (`aggregate_type`, `aggregate_id`, `aggregate_seq`)
//! - Audit context (`actor_type`, `actor_id`)
//! - Causation (`causation_id`), linking a hand-off to the release that caused it
//!
//! ## Event Types
//!
//! - Loan events (`loan.*`)
//! - Reservation events (`reservation.*`)
//! - Hand-off events (`handoff.*`)
//! - Inventory and bookcase events (`item.*`, `bookcase.*`)

mod envelope;
mod error;
mod types;

pub use envelope::*;
pub use error::EventError;
pub use types::*;
