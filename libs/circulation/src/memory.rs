//! In-memory collaborators for tests and embedding.
//!
//! Each store is a cloneable handle over shared state, so a test can keep a
//! clone to inspect or edit records after moving another clone into the
//! engine. The loan store can be told to fail writes.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use shelfmark_id::{BookKey, LoanId, RequesterId};
use shelfmark_packing::Book;
use tracing::debug;

use crate::{ItemStore, Loan, LoanStore, RequesterDirectory, StoreError};

fn lock<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable(format!("{store} lock poisoned")))
}

// =============================================================================
// Items
// =============================================================================

/// Book table keyed by [`BookKey`].
#[derive(Debug, Clone, Default)]
pub struct MemoryItemStore {
    books: Arc<Mutex<BTreeMap<BookKey, Book>>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `books`. Later duplicates replace earlier ones.
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let map = books.into_iter().map(|b| (b.key.clone(), b)).collect();
        Self {
            books: Arc::new(Mutex::new(map)),
        }
    }

    /// Inserts or replaces a book, as an external catalogue edit would.
    pub fn upsert(&self, book: Book) -> Result<(), StoreError> {
        lock(&self.books, "item")?.insert(book.key.clone(), book);
        Ok(())
    }

    /// Deletes a book record.
    pub fn delete(&self, key: &BookKey) -> Result<Option<Book>, StoreError> {
        Ok(lock(&self.books, "item")?.remove(key))
    }
}

impl ItemStore for MemoryItemStore {
    fn get(&self, key: &BookKey) -> Result<Option<Book>, StoreError> {
        Ok(lock(&self.books, "item")?.get(key).cloned())
    }

    fn set_allocated(&mut self, key: &BookKey, allocated: bool) -> Result<(), StoreError> {
        let mut books = lock(&self.books, "item")?;
        let book = books
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(format!("book {key}")))?;
        book.allocated = allocated;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(lock(&self.books, "item")?.values().cloned().collect())
    }
}

// =============================================================================
// Loans
// =============================================================================

#[derive(Debug, Default)]
struct LoanTable {
    loans: BTreeMap<LoanId, Loan>,
    ended: HashSet<LoanId>,
    persists_before_failure: usize,
    failing_persists: usize,
    failing_ends: usize,
}

/// Loan table with write-failure injection.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoanStore {
    table: Arc<Mutex<LoanTable>>,
}

impl MemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls to `persist` fail.
    pub fn fail_next_persists(&self, count: usize) -> Result<(), StoreError> {
        self.fail_persists_after(0, count)
    }

    /// Lets `succeed` calls to `persist` through, then fails `count`.
    pub fn fail_persists_after(&self, succeed: usize, count: usize) -> Result<(), StoreError> {
        let mut table = lock(&self.table, "loan")?;
        table.persists_before_failure = succeed;
        table.failing_persists = count;
        Ok(())
    }

    /// Makes the next `count` calls to `end` fail.
    pub fn fail_next_ends(&self, count: usize) -> Result<(), StoreError> {
        lock(&self.table, "loan")?.failing_ends = count;
        Ok(())
    }

    /// Returns a persisted loan.
    pub fn loan(&self, id: LoanId) -> Result<Option<Loan>, StoreError> {
        Ok(lock(&self.table, "loan")?.loans.get(&id).cloned())
    }

    /// Returns true if `end` was called for `id`.
    pub fn is_ended(&self, id: LoanId) -> Result<bool, StoreError> {
        Ok(lock(&self.table, "loan")?.ended.contains(&id))
    }

    /// Number of persisted loans, ended or not.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.table, "loan")?.loans.len())
    }
}

impl LoanStore for MemoryLoanStore {
    fn persist(&mut self, loan: &Loan) -> Result<(), StoreError> {
        let mut table = lock(&self.table, "loan")?;
        if table.persists_before_failure > 0 {
            table.persists_before_failure -= 1;
        } else if table.failing_persists > 0 {
            table.failing_persists -= 1;
            debug!(loan = %loan.id, "injected persist failure");
            return Err(StoreError::Rejected(format!("persist of {} refused", loan.id)));
        }
        table.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    fn end(&mut self, loan_id: LoanId) -> Result<(), StoreError> {
        let mut table = lock(&self.table, "loan")?;
        if !table.loans.contains_key(&loan_id) {
            return Err(StoreError::NotFound(format!("loan {loan_id}")));
        }
        if table.failing_ends > 0 {
            table.failing_ends -= 1;
            debug!(loan = %loan_id, "injected end failure");
            return Err(StoreError::Unavailable(format!("end of {loan_id} refused")));
        }
        table.ended.insert(loan_id);
        Ok(())
    }
}

// =============================================================================
// Requesters
// =============================================================================

/// Set of known requesters.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    requesters: Arc<Mutex<HashSet<RequesterId>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requesters(requesters: impl IntoIterator<Item = RequesterId>) -> Self {
        Self {
            requesters: Arc::new(Mutex::new(requesters.into_iter().collect())),
        }
    }

    /// Registers a new requester and returns its ID.
    pub fn register(&self) -> Result<RequesterId, StoreError> {
        let id = RequesterId::new();
        lock(&self.requesters, "requester")?.insert(id);
        Ok(id)
    }

    /// Removes a requester, as deleting a user account would.
    pub fn remove(&self, id: &RequesterId) -> Result<bool, StoreError> {
        Ok(lock(&self.requesters, "requester")?.remove(id))
    }
}

impl RequesterDirectory for MemoryDirectory {
    fn exists(&self, requester: &RequesterId) -> bool {
        lock(&self.requesters, "requester")
            .map(|set| set.contains(requester))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmark_testing::{book, key};

    #[test]
    fn test_item_store_clones_share_state() {
        let store = MemoryItemStore::with_books(vec![book("B1", 1.0, 2.0)]);
        let mut engine_side = store.clone();

        engine_side.set_allocated(&key("B1"), true).unwrap();
        assert!(store.get(&key("B1")).unwrap().unwrap().allocated);
    }

    #[test]
    fn test_set_allocated_unknown_book() {
        let mut store = MemoryItemStore::new();
        assert!(matches!(
            store.set_allocated(&key("B9"), true),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_loan_store_failure_injection() {
        let mut store = MemoryLoanStore::new();
        store.fail_next_persists(1).unwrap();
        let loan = Loan::new(RequesterId::new(), key("B1"));

        assert!(matches!(store.persist(&loan), Err(StoreError::Rejected(_))));
        assert!(store.persist(&loan).is_ok());
        assert_eq!(store.len().unwrap(), 1);

        store.fail_next_ends(1).unwrap();
        assert!(matches!(store.end(loan.id), Err(StoreError::Unavailable(_))));
        assert!(!store.is_ended(loan.id).unwrap());
        store.end(loan.id).unwrap();
        assert!(store.is_ended(loan.id).unwrap());
        assert!(store.end(LoanId::new()).is_err());
    }

    #[test]
    fn test_loan_store_delayed_failure() {
        let mut store = MemoryLoanStore::new();
        store.fail_persists_after(1, 1).unwrap();
        let first = Loan::new(RequesterId::new(), key("B1"));
        let second = Loan::new(RequesterId::new(), key("B2"));

        assert!(store.persist(&first).is_ok());
        assert!(store.persist(&second).is_err());
        assert!(store.persist(&second).is_ok());
    }

    #[test]
    fn test_directory_register_and_remove() {
        let directory = MemoryDirectory::new();
        let id = directory.register().unwrap();
        assert!(directory.exists(&id));
        assert!(directory.remove(&id).unwrap());
        assert!(!directory.exists(&id));
    }
}
