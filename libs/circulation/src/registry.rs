//! Per-book FIFO reservation queues.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelfmark_id::{BookKey, RequesterId};

/// One requester waiting for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationEntry {
    pub requester: RequesterId,
    pub book: BookKey,
    pub enqueued_at: DateTime<Utc>,
}

/// Where a queued requester stands. Position 0 is next in line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePosition {
    pub book: BookKey,
    pub position: usize,
}

/// Waiting lists keyed by book.
///
/// Holds keys and requester IDs only, never book records. A queue is
/// dropped as soon as it becomes empty, so `has_waiters` is the same as
/// "has a queue".
#[derive(Debug, Clone, Default)]
pub struct ReservationRegistry {
    queues: HashMap<BookKey, VecDeque<ReservationEntry>>,
}

impl ReservationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `requester` to the queue for `book`. Never fails; the same
    /// requester may be queued more than once.
    pub fn enqueue(&mut self, book: BookKey, requester: RequesterId) -> QueuePosition {
        let queue = self.queues.entry(book.clone()).or_default();
        queue.push_back(ReservationEntry {
            requester,
            book: book.clone(),
            enqueued_at: Utc::now(),
        });
        QueuePosition {
            book,
            position: queue.len() - 1,
        }
    }

    /// Puts an entry back at the head of its queue.
    pub fn requeue_front(&mut self, entry: ReservationEntry) {
        self.queues
            .entry(entry.book.clone())
            .or_default()
            .push_front(entry);
    }

    /// The requester next in line for `book`.
    pub fn peek(&self, book: &BookKey) -> Option<RequesterId> {
        self.queues
            .get(book)
            .and_then(VecDeque::front)
            .map(|e| e.requester)
    }

    /// Removes and returns the head of the queue for `book`.
    pub fn pop(&mut self, book: &BookKey) -> Option<ReservationEntry> {
        let queue = self.queues.get_mut(book)?;
        let entry = queue.pop_front();
        if queue.is_empty() {
            self.queues.remove(book);
        }
        entry
    }

    pub fn has_waiters(&self, book: &BookKey) -> bool {
        self.queues.contains_key(book)
    }

    pub fn waiting_count(&self, book: &BookKey) -> usize {
        self.queues.get(book).map_or(0, VecDeque::len)
    }

    /// Requesters queued for `book`, head first.
    pub fn waiters(&self, book: &BookKey) -> Vec<RequesterId> {
        self.queues
            .get(book)
            .map(|q| q.iter().map(|e| e.requester).collect())
            .unwrap_or_default()
    }

    /// First position of `requester` in the queue for `book`.
    pub fn position(&self, book: &BookKey, requester: &RequesterId) -> Option<usize> {
        self.queues
            .get(book)?
            .iter()
            .position(|e| &e.requester == requester)
    }

    /// Removes `requester` from every queue. Returns the removed entries.
    pub fn cancel(&mut self, requester: &RequesterId) -> Vec<ReservationEntry> {
        let mut removed = Vec::new();
        self.queues.retain(|_, queue| {
            let (gone, kept): (VecDeque<_>, VecDeque<_>) =
                queue.drain(..).partition(|e| &e.requester == requester);
            removed.extend(gone);
            *queue = kept;
            !queue.is_empty()
        });
        removed.sort_by(|a, b| a.book.cmp(&b.book));
        removed
    }

    /// Drops the whole queue for `book`.
    pub fn clear(&mut self, book: &BookKey) -> Vec<ReservationEntry> {
        self.queues
            .remove(book)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Number of entries across all queues.
    pub fn total_waiting(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Every entry, ordered by book key and then queue position.
    pub fn pending(&self) -> Vec<ReservationEntry> {
        let mut books: Vec<&BookKey> = self.queues.keys().collect();
        books.sort();
        books
            .into_iter()
            .flat_map(|book| self.queues[book].iter().cloned())
            .collect()
    }

    /// Number of books with at least one waiter.
    pub fn book_count(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
