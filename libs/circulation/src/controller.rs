//! Loan lifecycle controller.
//!
//! [`Circulation`] owns the available index, the reservation registry, the
//! loan ledger and the journal, and is the only component that mutates
//! them. Every transition runs to completion inside one `&mut self` call,
//! including the hand-off that follows a release, so no other request can
//! observe a freed book before its first waiter has been served.

use std::fmt;

use serde::Serialize;
use shelfmark_events::{
    BookcaseReorganizedPayload, CirculationEvent, HandoffDeferredPayload, HandoffGrantedPayload,
    ItemWithdrawnPayload, LoanCreatedPayload, LoanEndedPayload, ReservationQueuedPayload,
    ReservationRemovedPayload, TerminationReason,
};
use shelfmark_id::{BookKey, EventId, LoanId, RequesterId};
use shelfmark_packing::{Arrangement, Book, Packer, PackingStrategy};
use tracing::{debug, error, info, instrument, warn};

use crate::journal::{Actor, Journal, JournalEntry};
use crate::report::{self, AuthorSummary, ValueOrder, ValueReport};
use crate::{
    AvailableIndex, CirculationError, EngineConfig, ErrorKind, ItemStore, Loan, LoanLedger,
    LoanStore, QueuePosition, RequesterDirectory, ReservationRegistry, StoreError,
};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a create: the book was lent, or the requester was queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AllocationOutcome {
    Allocated(Loan),
    Queued(QueuePosition),
}

impl AllocationOutcome {
    pub fn is_allocated(&self) -> bool {
        matches!(self, Self::Allocated(_))
    }

    pub fn loan(&self) -> Option<&Loan> {
        match self {
            Self::Allocated(loan) => Some(loan),
            Self::Queued(_) => None,
        }
    }

    pub fn position(&self) -> Option<&QueuePosition> {
        match self {
            Self::Allocated(_) => None,
            Self::Queued(position) => Some(position),
        }
    }
}

/// What happened to the head of the queue when a book was released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HandoffOutcome {
    /// The waiter received a loan.
    Granted(Loan),
    /// The loan could not be created. The waiter is back at the head of
    /// the queue.
    Deferred {
        requester: RequesterId,
        reason: String,
    },
}

impl HandoffOutcome {
    pub fn granted(&self) -> Option<&Loan> {
        match self {
            Self::Granted(loan) => Some(loan),
            Self::Deferred { .. } => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred { .. })
    }
}

/// Result of ending a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminationReport {
    pub ended: Loan,
    /// `None` when nobody was waiting.
    pub handoff: Option<HandoffOutcome>,
    /// Waiters skipped because the directory no longer knows them.
    pub discarded: Vec<RequesterId>,
}

impl TerminationReport {
    /// The recoverable warning raised by a deferred hand-off, if any.
    pub fn warning(&self) -> Option<&str> {
        match &self.handoff {
            Some(HandoffOutcome::Deferred { reason, .. }) => Some(reason),
            _ => None,
        }
    }
}

/// Result of swapping a loan to another book.
///
/// The old book is released in both cases; only the new loan is
/// conditional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplaceOutcome {
    Replaced {
        release: TerminationReport,
        loan: Loan,
    },
    /// The new book was on loan; the requester now waits for it.
    NewItemUnavailable {
        release: TerminationReport,
        position: QueuePosition,
    },
    /// Lending the new book failed after the old one was released.
    NewItemFailed {
        release: TerminationReport,
        kind: ErrorKind,
        reason: String,
    },
}

impl ReplaceOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, Self::Replaced { .. })
    }

    pub fn release(&self) -> &TerminationReport {
        match self {
            Self::Replaced { release, .. }
            | Self::NewItemUnavailable { release, .. }
            | Self::NewItemFailed { release, .. } => release,
        }
    }
}

/// Why a reorganization was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorganizeTrigger {
    Manual,
    Scheduled,
    InventoryChanged,
}

impl fmt::Display for ReorganizeTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReorganizeTrigger::Manual => "manual",
            ReorganizeTrigger::Scheduled => "scheduled",
            ReorganizeTrigger::InventoryChanged => "inventory_changed",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Controller
// =============================================================================

/// The allocation and reservation engine.
pub struct Circulation {
    items: Box<dyn ItemStore>,
    loan_store: Box<dyn LoanStore>,
    requesters: Box<dyn RequesterDirectory>,
    packer: Box<dyn Packer>,
    capacity: f64,

    index: AvailableIndex,
    registry: ReservationRegistry,
    ledger: LoanLedger,
    journal: Journal,
    arrangement: Option<Arrangement>,
}

impl fmt::Debug for Circulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circulation")
            .field("strategy", &self.packer.strategy())
            .field("capacity", &self.capacity)
            .field("available", &self.index.len())
            .field("waiting", &self.registry.total_waiting())
            .field("active_loans", &self.ledger.active_count())
            .finish()
    }
}

impl Circulation {
    /// Creates an engine and loads the available index from `items`.
    pub fn new(
        config: &EngineConfig,
        items: impl ItemStore + 'static,
        loan_store: impl LoanStore + 'static,
        requesters: impl RequesterDirectory + 'static,
    ) -> Result<Self, CirculationError> {
        let index = AvailableIndex::from_books(items.list_all()?);
        info!(
            available = index.len(),
            strategy = %config.strategy,
            capacity = config.shelf_capacity,
            "circulation engine loaded"
        );

        Ok(Self {
            items: Box::new(items),
            loan_store: Box::new(loan_store),
            requesters: Box::new(requesters),
            packer: config.packer(),
            capacity: config.shelf_capacity,
            index,
            registry: ReservationRegistry::new(),
            ledger: LoanLedger::new(),
            journal: Journal::new(),
            arrangement: None,
        })
    }

    /// Adopts loans that were active before this engine was created, so
    /// they can be terminated.
    pub fn with_active_loans(mut self, loans: impl IntoIterator<Item = Loan>) -> Self {
        for loan in loans.into_iter().filter(|l| l.active) {
            self.index.remove(&loan.book);
            self.ledger.open(loan);
        }
        self
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Lends `book` to `requester`, or queues the requester if the book is
    /// on loan or already has waiters.
    ///
    /// Asking for a book one already holds fails with
    /// [`CirculationError::AlreadyHolding`].
    #[instrument(skip(self))]
    pub fn create(
        &mut self,
        requester: RequesterId,
        book: &BookKey,
    ) -> Result<AllocationOutcome, CirculationError> {
        if !self.requesters.exists(&requester) {
            return Err(CirculationError::UnknownRequester(requester));
        }
        self.allocate(requester, book)
    }

    /// Ends a loan, frees its book and hands it to the first waiter.
    ///
    /// At most one loan is granted per call. A hand-off that fails is
    /// reported through [`TerminationReport::warning`], not as an error.
    #[instrument(skip(self))]
    pub fn terminate(
        &mut self,
        loan_id: LoanId,
        reason: TerminationReason,
    ) -> Result<TerminationReport, CirculationError> {
        let loan = self
            .ledger
            .get(loan_id)
            .cloned()
            .ok_or(CirculationError::UnknownLoan(loan_id))?;

        let released = self.release_flag(&loan.book)?;
        if let Err(e) = self.loan_store.end(loan_id) {
            if released.is_some() {
                if let Err(rollback) = self.items.set_allocated(&loan.book, true) {
                    error!(book = %loan.book, error = %rollback, "failed to restore allocation flag");
                }
            }
            return Err(e.into());
        }
        let ended = self.ledger.close(loan_id, reason).ok_or_else(|| {
            CirculationError::InvariantViolation(format!("loan {loan_id} left the ledger early"))
        })?;

        let cause = self.journal.record(
            CirculationEvent::LoanEnded(LoanEndedPayload {
                loan_id,
                requester: loan.holder,
                book: loan.book.clone(),
                reason,
            }),
            Actor::Requester(loan.holder),
            None,
        );
        info!(loan = %loan_id, book = %loan.book, requester = %loan.holder, %reason, "loan ended");

        let mut discarded = Vec::new();
        let handoff = match released {
            Some(book) => {
                if let Err(e) = self.reindex(book) {
                    error!(book = %loan.book, error = %e, "released book could not be indexed");
                }
                self.hand_off(&loan.book, cause, &mut discarded)
            }
            None => {
                warn!(book = %loan.book, "released book is no longer catalogued");
                discarded = self.discard_queue(&loan.book, cause);
                None
            }
        };

        Ok(TerminationReport {
            ended,
            handoff,
            discarded,
        })
    }

    /// Releases the loan's book and lends `new_book` to the same holder.
    ///
    /// The release is final even when `new_book` turns out to be on loan.
    #[instrument(skip(self))]
    pub fn replace(
        &mut self,
        loan_id: LoanId,
        new_book: &BookKey,
    ) -> Result<ReplaceOutcome, CirculationError> {
        let loan = self
            .ledger
            .get(loan_id)
            .cloned()
            .ok_or(CirculationError::UnknownLoan(loan_id))?;
        if &loan.book == new_book {
            return Err(CirculationError::SameItemReplacement(new_book.clone()));
        }
        if self.items.get(new_book)?.is_none() {
            return Err(CirculationError::UnknownItem(new_book.clone()));
        }
        self.check_not_holding(loan.holder, new_book)?;

        let release = self.terminate(loan_id, TerminationReason::Replaced)?;
        match self.allocate(loan.holder, new_book) {
            Ok(AllocationOutcome::Allocated(loan)) => Ok(ReplaceOutcome::Replaced { release, loan }),
            Err(err) => {
                warn!(
                    old_book = %loan.book,
                    book = %new_book,
                    requester = %loan.holder,
                    error = %err,
                    "replacement failed, old book stays released"
                );
                Ok(ReplaceOutcome::NewItemFailed {
                    release,
                    kind: err.kind(),
                    reason: err.to_string(),
                })
            }
            Ok(AllocationOutcome::Queued(position)) => {
                info!(
                    old_book = %loan.book,
                    book = %new_book,
                    requester = %loan.holder,
                    "replacement book on loan, old book stays released"
                );
                Ok(ReplaceOutcome::NewItemUnavailable { release, position })
            }
        }
    }

    /// Packs the currently available books onto shelves.
    ///
    /// Allocation flags and the index are left untouched.
    #[instrument(skip(self))]
    pub fn reorganize(&mut self, trigger: ReorganizeTrigger) -> Result<Arrangement, CirculationError> {
        let books = self.index.snapshot();
        let arrangement = self.packer.organize(&books, self.capacity)?;

        self.journal.record(
            CirculationEvent::BookcaseReorganized(BookcaseReorganizedPayload {
                strategy: arrangement.strategy.to_string(),
                trigger: trigger.to_string(),
                capacity: self.capacity,
                shelf_count: arrangement.shelf_count(),
                unplaced_count: arrangement.unplaced.len(),
                hazard_count: arrangement.hazards.len(),
            }),
            Actor::System,
            None,
        );
        info!(
            %trigger,
            strategy = %arrangement.strategy,
            books = books.len(),
            shelves = arrangement.shelf_count(),
            unplaced = arrangement.unplaced.len(),
            "bookcase reorganized"
        );

        self.arrangement = Some(arrangement.clone());
        Ok(arrangement)
    }

    /// Removes `requester` from every queue and returns the affected books.
    #[instrument(skip(self))]
    pub fn cancel_reservations(&mut self, requester: RequesterId) -> Vec<BookKey> {
        let removed = self.registry.cancel(&requester);
        for entry in &removed {
            self.journal.record(
                CirculationEvent::ReservationCancelled(ReservationRemovedPayload {
                    requester,
                    book: entry.book.clone(),
                }),
                Actor::Requester(requester),
                None,
            );
        }
        debug!(requester = %requester, cancelled = removed.len(), "reservations cancelled");
        removed.into_iter().map(|e| e.book).collect()
    }

    // -------------------------------------------------------------------------
    // Inventory sync
    // -------------------------------------------------------------------------

    /// Re-reads one book after an external edit and fixes its index entry.
    ///
    /// A book that became available while requesters wait for it is handed
    /// to the first of them.
    #[instrument(skip(self))]
    pub fn sync_item(&mut self, key: &BookKey) -> Result<Option<HandoffOutcome>, CirculationError> {
        match self.items.get(key)? {
            Some(book) if book.is_available() => {
                self.reindex(book)?;
                if self.registry.has_waiters(key) {
                    let mut discarded = Vec::new();
                    return Ok(self.hand_off(key, None, &mut discarded));
                }
            }
            Some(_) => {
                if self.index.remove(key) {
                    debug!(book = %key, "allocated book dropped from index");
                }
            }
            None => {
                self.index.remove(key);
                self.discard_queue(key, None);
                debug!(book = %key, "deleted book dropped from index");
            }
        }
        Ok(None)
    }

    /// Takes an available book out of circulation and drops its queue.
    ///
    /// Returns the number of reservations cleared.
    #[instrument(skip(self))]
    pub fn withdraw_item(&mut self, key: &BookKey) -> Result<usize, CirculationError> {
        let book = self
            .items
            .get(key)?
            .ok_or_else(|| CirculationError::UnknownItem(key.clone()))?;
        if book.allocated {
            return Err(CirculationError::ItemOnLoan(key.clone()));
        }

        self.index.remove(key);
        let cleared = self.registry.clear(key).len();
        self.journal.record(
            CirculationEvent::ItemWithdrawn(ItemWithdrawnPayload {
                book: key.clone(),
                cleared_reservations: cleared,
            }),
            Actor::System,
            None,
        );
        info!(book = %key, cleared, "book withdrawn");
        Ok(cleared)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Available books in key order.
    pub fn available(&self) -> Vec<Book> {
        self.index.snapshot()
    }

    pub fn index(&self) -> &AvailableIndex {
        &self.index
    }

    pub fn registry(&self) -> &ReservationRegistry {
        &self.registry
    }

    pub fn loan(&self, id: LoanId) -> Option<&Loan> {
        self.ledger.get(id)
    }

    pub fn active_loans_for(&self, requester: &RequesterId) -> Vec<Loan> {
        self.ledger.active_for(requester)
    }

    pub fn history_for(&self, requester: &RequesterId) -> &[Loan] {
        self.ledger.history_for(requester)
    }

    /// Most recent arrangement produced by [`Circulation::reorganize`].
    pub fn arrangement(&self) -> Option<&Arrangement> {
        self.arrangement.as_ref()
    }

    pub fn strategy(&self) -> PackingStrategy {
        self.packer.strategy()
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Every catalogued book ordered by value.
    pub fn value_report(&self, order: ValueOrder) -> Result<ValueReport, CirculationError> {
        Ok(report::value_report(&self.items.list_all()?, order))
    }

    pub fn author_summary(&self, author: &str) -> Result<AuthorSummary, CirculationError> {
        Ok(report::author_summary(&self.items.list_all()?, author))
    }

    /// Hands all journaled events to the caller.
    pub fn drain_events(&mut self) -> Vec<JournalEntry> {
        self.journal.drain()
    }

    pub fn pending_events(&self) -> &[JournalEntry] {
        self.journal.pending()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn allocate(
        &mut self,
        requester: RequesterId,
        key: &BookKey,
    ) -> Result<AllocationOutcome, CirculationError> {
        let book = self
            .items
            .get(key)?
            .ok_or_else(|| CirculationError::UnknownItem(key.clone()))?;
        self.check_not_holding(requester, key)?;

        if !book.allocated && self.registry.has_waiters(key) {
            // An earlier hand-off was deferred: serve the head before anyone new.
            let mut discarded = Vec::new();
            match self.hand_off(key, None, &mut discarded) {
                Some(HandoffOutcome::Granted(loan)) if loan.holder == requester => {
                    return Ok(AllocationOutcome::Allocated(loan));
                }
                Some(_) => return Ok(self.enqueue(requester, key)),
                None => {}
            }
        }

        if book.allocated {
            return Ok(self.enqueue(requester, key));
        }

        self.grant(requester, key, false, None)
            .map(AllocationOutcome::Allocated)
    }

    fn enqueue(&mut self, requester: RequesterId, key: &BookKey) -> AllocationOutcome {
        let position = self.registry.enqueue(key.clone(), requester);
        self.journal.record(
            CirculationEvent::ReservationQueued(ReservationQueuedPayload {
                requester,
                book: key.clone(),
                position: position.position,
            }),
            Actor::Requester(requester),
            None,
        );
        debug!(book = %key, requester = %requester, position = position.position, "reservation queued");
        AllocationOutcome::Queued(position)
    }

    fn check_not_holding(&self, requester: RequesterId, key: &BookKey) -> Result<(), CirculationError> {
        match self.ledger.for_book(key) {
            Some(active) if active.holder == requester => Err(CirculationError::AlreadyHolding {
                requester,
                book: key.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Clears the allocation flag of a released book and returns the book
    /// as it now stands, or `None` if it has left the catalogue.
    fn release_flag(&mut self, key: &BookKey) -> Result<Option<Book>, CirculationError> {
        let Some(book) = self.items.get(key)? else {
            return Ok(None);
        };
        match self.items.set_allocated(key, false) {
            Ok(()) => Ok(Some(book.with_allocated(false))),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Flags the book, persists a new loan and drops the book from the
    /// index. The flag is rolled back if the loan cannot be persisted.
    fn grant(
        &mut self,
        requester: RequesterId,
        key: &BookKey,
        via_handoff: bool,
        cause: Option<EventId>,
    ) -> Result<Loan, CirculationError> {
        self.items.set_allocated(key, true)?;

        let loan = Loan::new(requester, key.clone());
        if let Err(e) = self.loan_store.persist(&loan) {
            if let Err(rollback) = self.items.set_allocated(key, false) {
                error!(book = %key, error = %rollback, "failed to roll back allocation flag");
            }
            return Err(e.into());
        }

        if !self.index.remove(key) {
            debug!(book = %key, "granted book was not indexed");
        }
        self.ledger.open(loan.clone());

        let actor = if via_handoff {
            Actor::System
        } else {
            Actor::Requester(requester)
        };
        self.journal.record(
            CirculationEvent::LoanCreated(LoanCreatedPayload {
                loan_id: loan.id,
                requester,
                book: key.clone(),
                via_handoff,
            }),
            actor,
            cause,
        );
        info!(loan = %loan.id, book = %key, requester = %requester, via_handoff, "loan created");
        Ok(loan)
    }

    /// Serves the head of the queue for a just-freed book.
    ///
    /// Waiters unknown to the directory are discarded; the first known
    /// waiter gets the loan or, if that fails, goes back to the head.
    fn hand_off(
        &mut self,
        key: &BookKey,
        cause: Option<EventId>,
        discarded: &mut Vec<RequesterId>,
    ) -> Option<HandoffOutcome> {
        while let Some(entry) = self.registry.pop(key) {
            let requester = entry.requester;

            if !self.requesters.exists(&requester) {
                self.journal.record(
                    CirculationEvent::ReservationDiscarded(ReservationRemovedPayload {
                        requester,
                        book: key.clone(),
                    }),
                    Actor::System,
                    cause,
                );
                debug!(book = %key, requester = %requester, "discarding reservation of unknown requester");
                discarded.push(requester);
                continue;
            }

            let attempt = match self.items.get(key) {
                Ok(Some(book)) if book.is_available() => self.grant(requester, key, true, cause),
                Ok(Some(_)) => Err(CirculationError::InvariantViolation(format!(
                    "book {key} is still allocated at hand-off"
                ))),
                Ok(None) => Err(CirculationError::UnknownItem(key.clone())),
                Err(e) => Err(e.into()),
            };

            let outcome = match attempt {
                Ok(loan) => {
                    self.journal.record(
                        CirculationEvent::HandoffGranted(HandoffGrantedPayload {
                            book: key.clone(),
                            requester,
                            loan_id: loan.id,
                        }),
                        Actor::System,
                        cause,
                    );
                    info!(book = %key, requester = %requester, loan = %loan.id, "hand-off granted");
                    HandoffOutcome::Granted(loan)
                }
                Err(err) => {
                    let reason = err.to_string();
                    self.registry.requeue_front(entry);
                    self.journal.record(
                        CirculationEvent::HandoffDeferred(HandoffDeferredPayload {
                            book: key.clone(),
                            requester,
                            reason: reason.clone(),
                        }),
                        Actor::System,
                        cause,
                    );
                    warn!(book = %key, requester = %requester, error = %reason, "hand-off deferred, reservation kept at head of queue");
                    HandoffOutcome::Deferred { requester, reason }
                }
            };
            return Some(outcome);
        }
        None
    }

    /// Puts a freshly read available book into the index, replacing any
    /// stale copy.
    fn reindex(&mut self, book: Book) -> Result<(), CirculationError> {
        self.index.remove(&book.key);
        let key = book.key.clone();
        let position = self.index.insert(book)?;
        debug!(book = %key, position, "book indexed");
        Ok(())
    }

    fn discard_queue(&mut self, key: &BookKey, cause: Option<EventId>) -> Vec<RequesterId> {
        self.registry
            .clear(key)
            .into_iter()
            .map(|entry| {
                self.journal.record(
                    CirculationEvent::ReservationDiscarded(ReservationRemovedPayload {
                        requester: entry.requester,
                        book: key.clone(),
                    }),
                    Actor::System,
                    cause,
                );
                entry.requester
            })
            .collect()
    }
}
