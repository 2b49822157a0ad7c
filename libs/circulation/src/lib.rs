//! # shelfmark-circulation
//!
//! The allocation and reservation engine of the shelfmark library backend.
//!
//! ## Components
//!
//! - [`AvailableIndex`]: books not on loan, sorted by key.
//! - [`ReservationRegistry`]: one FIFO waiting list per book on loan.
//! - [`Circulation`]: the lifecycle controller. Create lends a book or
//!   queues the requester; terminate frees a book and hands it to the
//!   first waiter in the same step; replace chains the two; reorganize
//!   packs the available books onto shelves.
//! - [`CirculationService`]: runs the controller on a single tokio task so
//!   that every transition is serialized.
//!
//! Persistence and the user subsystem stay outside the engine, behind
//! [`ItemStore`], [`LoanStore`] and [`RequesterDirectory`].
//!
//! ## Invariants
//!
//! - A book is in the index if and only if its `allocated` flag is false.
//! - A queue exists for a book only while it has waiters.
//! - Waiters for one book are served strictly in arrival order.
//! - A failed hand-off never loses the waiter.

pub mod config;
mod controller;
mod error;
mod index;
pub mod journal;
mod loan;
pub mod memory;
mod registry;
pub mod report;
mod service;
mod store;
pub mod telemetry;

pub use config::EngineConfig;
pub use controller::{
    AllocationOutcome, Circulation, HandoffOutcome, ReorganizeTrigger, ReplaceOutcome,
    TerminationReport,
};
pub use error::{CirculationError, ErrorKind, StoreError};
pub use index::{AvailableIndex, IndexError};
pub use loan::{Loan, LoanLedger};
pub use registry::{QueuePosition, ReservationEntry, ReservationRegistry};
pub use service::{CirculationHandle, CirculationService, ServiceError};
pub use store::{ItemStore, LoanStore, RequesterDirectory};

pub use shelfmark_events::TerminationReason;
