//! Single-writer circulation service.
//!
//! The controller is moved onto one tokio task and fed from a bounded
//! mailbox, so every transition on every book is serialized. Callers talk
//! to it through a cloneable [`CirculationHandle`]; each request carries a
//! oneshot for its reply.

use shelfmark_events::TerminationReason;
use shelfmark_id::{BookKey, LoanId, RequesterId};
use shelfmark_packing::{Arrangement, Book};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::journal::JournalEntry;
use crate::{
    AllocationOutcome, Circulation, CirculationError, HandoffOutcome, ReorganizeTrigger,
    ReplaceOutcome, TerminationReport,
};

// =============================================================================
// Errors
// =============================================================================

/// Errors returned through a [`CirculationHandle`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service task has stopped.
    #[error("circulation service stopped")]
    Stopped,

    #[error(transparent)]
    Circulation(#[from] CirculationError),
}

// =============================================================================
// Messages
// =============================================================================

type Reply<T> = oneshot::Sender<T>;

/// Requests handled by the service task.
#[derive(Debug)]
enum Command {
    Create {
        requester: RequesterId,
        book: BookKey,
        reply_to: Reply<Result<AllocationOutcome, CirculationError>>,
    },
    Terminate {
        loan_id: LoanId,
        reason: TerminationReason,
        reply_to: Reply<Result<TerminationReport, CirculationError>>,
    },
    Replace {
        loan_id: LoanId,
        new_book: BookKey,
        reply_to: Reply<Result<ReplaceOutcome, CirculationError>>,
    },
    Reorganize {
        trigger: ReorganizeTrigger,
        reply_to: Reply<Result<Arrangement, CirculationError>>,
    },
    SyncItem {
        book: BookKey,
        reply_to: Reply<Result<Option<HandoffOutcome>, CirculationError>>,
    },
    Available {
        reply_to: Reply<Vec<Book>>,
    },
    CancelReservations {
        requester: RequesterId,
        reply_to: Reply<Vec<BookKey>>,
    },
    DrainEvents {
        reply_to: Reply<Vec<JournalEntry>>,
    },
    Shutdown {
        reply_to: Reply<Circulation>,
    },
}

// =============================================================================
// Service
// =============================================================================

/// Owns the controller on a dedicated task.
pub struct CirculationService {
    circulation: Circulation,
    mailbox: mpsc::Receiver<Command>,
}

impl CirculationService {
    /// Starts the service task and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(circulation: Circulation, mailbox_capacity: usize) -> CirculationHandle {
        let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
        let service = Self {
            circulation,
            mailbox: rx,
        };
        tokio::spawn(service.run());
        info!(mailbox_capacity, "circulation service started");
        CirculationHandle { tx }
    }

    async fn run(mut self) {
        let mut processed: u64 = 0;
        while let Some(command) = self.mailbox.recv().await {
            processed += 1;
            match command {
                Command::Shutdown { reply_to } => {
                    info!(processed, "circulation service stopping");
                    let _ = reply_to.send(self.circulation);
                    return;
                }
                other => self.handle(other),
            }
        }
        debug!(processed, "all handles dropped, circulation service exiting");
    }

    fn handle(&mut self, command: Command) {
        let c = &mut self.circulation;
        let delivered = match command {
            Command::Create {
                requester,
                book,
                reply_to,
            } => reply_to.send(c.create(requester, &book)).is_ok(),
            Command::Terminate {
                loan_id,
                reason,
                reply_to,
            } => reply_to.send(c.terminate(loan_id, reason)).is_ok(),
            Command::Replace {
                loan_id,
                new_book,
                reply_to,
            } => reply_to.send(c.replace(loan_id, &new_book)).is_ok(),
            Command::Reorganize { trigger, reply_to } => {
                reply_to.send(c.reorganize(trigger)).is_ok()
            }
            Command::SyncItem { book, reply_to } => reply_to.send(c.sync_item(&book)).is_ok(),
            Command::Available { reply_to } => reply_to.send(c.available()).is_ok(),
            Command::CancelReservations {
                requester,
                reply_to,
            } => reply_to.send(c.cancel_reservations(requester)).is_ok(),
            Command::DrainEvents { reply_to } => reply_to.send(c.drain_events()).is_ok(),
            Command::Shutdown { .. } => true,
        };
        if !delivered {
            // The transition was applied; only the caller went away.
            warn!("caller dropped before receiving its reply");
        }
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable handle to a running [`CirculationService`].
#[derive(Debug, Clone)]
pub struct CirculationHandle {
    tx: mpsc::Sender<Command>,
}

impl CirculationHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply_to, rx) = oneshot::channel();
        self.tx
            .send(build(reply_to))
            .await
            .map_err(|_| ServiceError::Stopped)?;
        rx.await.map_err(|_| ServiceError::Stopped)
    }

    pub async fn create(
        &self,
        requester: RequesterId,
        book: BookKey,
    ) -> Result<AllocationOutcome, ServiceError> {
        Ok(self
            .request(|reply_to| Command::Create {
                requester,
                book,
                reply_to,
            })
            .await??)
    }

    pub async fn terminate(
        &self,
        loan_id: LoanId,
        reason: TerminationReason,
    ) -> Result<TerminationReport, ServiceError> {
        Ok(self
            .request(|reply_to| Command::Terminate {
                loan_id,
                reason,
                reply_to,
            })
            .await??)
    }

    pub async fn replace(
        &self,
        loan_id: LoanId,
        new_book: BookKey,
    ) -> Result<ReplaceOutcome, ServiceError> {
        Ok(self
            .request(|reply_to| Command::Replace {
                loan_id,
                new_book,
                reply_to,
            })
            .await??)
    }

    pub async fn reorganize(&self, trigger: ReorganizeTrigger) -> Result<Arrangement, ServiceError> {
        Ok(self
            .request(|reply_to| Command::Reorganize { trigger, reply_to })
            .await??)
    }

    pub async fn sync_item(&self, book: BookKey) -> Result<Option<HandoffOutcome>, ServiceError> {
        Ok(self
            .request(|reply_to| Command::SyncItem { book, reply_to })
            .await??)
    }

    /// Snapshot of the available index.
    pub async fn available(&self) -> Result<Vec<Book>, ServiceError> {
        self.request(|reply_to| Command::Available { reply_to }).await
    }

    pub async fn cancel_reservations(
        &self,
        requester: RequesterId,
    ) -> Result<Vec<BookKey>, ServiceError> {
        self.request(|reply_to| Command::CancelReservations {
            requester,
            reply_to,
        })
        .await
    }

    pub async fn drain_events(&self) -> Result<Vec<JournalEntry>, ServiceError> {
        self.request(|reply_to| Command::DrainEvents { reply_to })
            .await
    }

    /// Stops the service after queued requests and returns the controller.
    pub async fn shutdown(&self) -> Result<Circulation, ServiceError> {
        self.request(|reply_to| Command::Shutdown { reply_to }).await
    }

    /// Returns true once the service task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
