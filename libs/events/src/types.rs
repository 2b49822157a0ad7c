//! Circulation event payloads.
//!
//! Each journaled transition is one variant of [`CirculationEvent`]. The
//! serialized form is adjacently tagged so the persistence layer can store
//! `event_type` and `payload` in separate columns.

use serde::{Deserialize, Serialize};
use shelfmark_id::{BookKey, LoanId, RequesterId};

use crate::EventError;

// =============================================================================
// Event Type Constants
// =============================================================================

/// All event type names as constants.
pub mod event_types {
    // Loans
    pub const LOAN_CREATED: &str = "loan.created";
    pub const LOAN_ENDED: &str = "loan.ended";

    // Reservations
    pub const RESERVATION_QUEUED: &str = "reservation.queued";
    pub const RESERVATION_CANCELLED: &str = "reservation.cancelled";
    pub const RESERVATION_DISCARDED: &str = "reservation.discarded";

    // Hand-off
    pub const HANDOFF_GRANTED: &str = "handoff.granted";
    pub const HANDOFF_DEFERRED: &str = "handoff.deferred";

    // Inventory
    pub const ITEM_WITHDRAWN: &str = "item.withdrawn";
    pub const BOOKCASE_REORGANIZED: &str = "bookcase.reorganized";

    /// Every known event type.
    pub const ALL: &[&str] = &[
        LOAN_CREATED,
        LOAN_ENDED,
        RESERVATION_QUEUED,
        RESERVATION_CANCELLED,
        RESERVATION_DISCARDED,
        HANDOFF_GRANTED,
        HANDOFF_DEFERRED,
        ITEM_WITHDRAWN,
        BOOKCASE_REORGANIZED,
    ];
}

/// Checks that an event type name is one the engine emits.
pub fn validate_event_type(event_type: &str) -> Result<(), EventError> {
    if event_types::ALL.contains(&event_type) {
        Ok(())
    } else {
        Err(EventError::UnknownEventType(event_type.to_string()))
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// Why a loan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The holder returned the book.
    Returned,
    /// The loan record was deleted.
    Deleted,
    /// The loan was released as the first half of a replacement.
    Replaced,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerminationReason::Returned => "returned",
            TerminationReason::Deleted => "deleted",
            TerminationReason::Replaced => "replaced",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Payloads
// =============================================================================

// -----------------------------------------------------------------------------
// Loan Events
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanCreatedPayload {
    pub loan_id: LoanId,
    pub requester: RequesterId,
    pub book: BookKey,
    /// True when the loan was granted from the reservation queue.
    pub via_handoff: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanEndedPayload {
    pub loan_id: LoanId,
    pub requester: RequesterId,
    pub book: BookKey,
    pub reason: TerminationReason,
}

// -----------------------------------------------------------------------------
// Reservation Events
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationQueuedPayload {
    pub requester: RequesterId,
    pub book: BookKey,
    /// Zero-based position in the book's waiting list.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRemovedPayload {
    pub requester: RequesterId,
    pub book: BookKey,
}

// -----------------------------------------------------------------------------
// Hand-off Events
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffGrantedPayload {
    pub book: BookKey,
    pub requester: RequesterId,
    pub loan_id: LoanId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffDeferredPayload {
    pub book: BookKey,
    pub requester: RequesterId,
    pub reason: String,
}

// -----------------------------------------------------------------------------
// Inventory Events
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemWithdrawnPayload {
    pub book: BookKey,
    pub cleared_reservations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookcaseReorganizedPayload {
    pub strategy: String,
    pub trigger: String,
    pub capacity: f64,
    pub shelf_count: usize,
    pub unplaced_count: usize,
    pub hazard_count: usize,
}

// =============================================================================
// Event Enum
// =============================================================================

/// A journaled circulation transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "payload")]
pub enum CirculationEvent {
    #[serde(rename = "loan.created")]
    LoanCreated(LoanCreatedPayload),
    #[serde(rename = "loan.ended")]
    LoanEnded(LoanEndedPayload),
    #[serde(rename = "reservation.queued")]
    ReservationQueued(ReservationQueuedPayload),
    #[serde(rename = "reservation.cancelled")]
    ReservationCancelled(ReservationRemovedPayload),
    #[serde(rename = "reservation.discarded")]
    ReservationDiscarded(ReservationRemovedPayload),
    #[serde(rename = "handoff.granted")]
    HandoffGranted(HandoffGrantedPayload),
    #[serde(rename = "handoff.deferred")]
    HandoffDeferred(HandoffDeferredPayload),
    #[serde(rename = "item.withdrawn")]
    ItemWithdrawn(ItemWithdrawnPayload),
    #[serde(rename = "bookcase.reorganized")]
    BookcaseReorganized(BookcaseReorganizedPayload),
}

impl CirculationEvent {
    /// Returns the dotted event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            CirculationEvent::LoanCreated(_) => event_types::LOAN_CREATED,
            CirculationEvent::LoanEnded(_) => event_types::LOAN_ENDED,
            CirculationEvent::ReservationQueued(_) => event_types::RESERVATION_QUEUED,
            CirculationEvent::ReservationCancelled(_) => event_types::RESERVATION_CANCELLED,
            CirculationEvent::ReservationDiscarded(_) => event_types::RESERVATION_DISCARDED,
            CirculationEvent::HandoffGranted(_) => event_types::HANDOFF_GRANTED,
            CirculationEvent::HandoffDeferred(_) => event_types::HANDOFF_DEFERRED,
            CirculationEvent::ItemWithdrawn(_) => event_types::ITEM_WITHDRAWN,
            CirculationEvent::BookcaseReorganized(_) => event_types::BOOKCASE_REORGANIZED,
        }
    }

    /// Returns the book this event concerns, or `None` for bookcase events.
    pub fn book(&self) -> Option<&BookKey> {
        match self {
            CirculationEvent::LoanCreated(p) => Some(&p.book),
            CirculationEvent::LoanEnded(p) => Some(&p.book),
            CirculationEvent::ReservationQueued(p) => Some(&p.book),
            CirculationEvent::ReservationCancelled(p) => Some(&p.book),
            CirculationEvent::ReservationDiscarded(p) => Some(&p.book),
            CirculationEvent::HandoffGranted(p) => Some(&p.book),
            CirculationEvent::HandoffDeferred(p) => Some(&p.book),
            CirculationEvent::ItemWithdrawn(p) => Some(&p.book),
            CirculationEvent::BookcaseReorganized(_) => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
