//! Sorted index of available books.

use shelfmark_id::BookKey;
use shelfmark_packing::Book;
use thiserror::Error;

use crate::CirculationError;

/// Rejected index insertions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("book {0} is already indexed")]
    Duplicate(BookKey),

    #[error("book {0} is allocated and cannot be indexed")]
    Allocated(BookKey),
}

impl From<IndexError> for CirculationError {
    fn from(err: IndexError) -> Self {
        CirculationError::InvariantViolation(err.to_string())
    }
}

/// Books with `allocated == false`, kept sorted by key with no duplicates.
///
/// Lookups are binary searches; insert and remove shift the tail.
#[derive(Debug, Clone, Default)]
pub struct AvailableIndex {
    books: Vec<Book>,
}

impl AvailableIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from the available books in `books`.
    ///
    /// Allocated books are skipped; for repeated keys the first one wins.
    pub fn from_books(books: impl IntoIterator<Item = Book>) -> Self {
        let mut available: Vec<Book> = books.into_iter().filter(Book::is_available).collect();
        available.sort_by(|a, b| a.key.cmp(&b.key));
        available.dedup_by(|later, earlier| later.key == earlier.key);
        Self { books: available }
    }

    /// Inserts an available book at its sorted position and returns it.
    pub fn insert(&mut self, book: Book) -> Result<usize, IndexError> {
        if book.allocated {
            return Err(IndexError::Allocated(book.key));
        }
        let pos = self.books.partition_point(|b| b.key < book.key);
        if self.books.get(pos).is_some_and(|b| b.key == book.key) {
            return Err(IndexError::Duplicate(book.key));
        }
        self.books.insert(pos, book);
        Ok(pos)
    }

    /// Removes the book with `key`. Returns false if it was not indexed.
    pub fn remove(&mut self, key: &BookKey) -> bool {
        self.take(key).is_some()
    }

    /// Removes and returns the book with `key`.
    pub fn take(&mut self, key: &BookKey) -> Option<Book> {
        let pos = self.position(key)?;
        Some(self.books.remove(pos))
    }

    pub fn contains(&self, key: &BookKey) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &BookKey) -> Option<&Book> {
        self.position(key).map(|pos| &self.books[pos])
    }

    /// Sorted position of `key`, if indexed.
    pub fn position(&self, key: &BookKey) -> Option<usize> {
        self.books.binary_search_by(|b| b.key.cmp(key)).ok()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Book> {
        self.books.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BookKey> {
        self.books.iter().map(|b| &b.key)
    }

    /// Copies the current contents, in key order.
    pub fn snapshot(&self) -> Vec<Book> {
        self.books.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shelfmark_testing::strategies::arb_book;
    use shelfmark_testing::{book, key};

    #[test]
    fn test_insert_keeps_order() {
        let mut index = AvailableIndex::new();
        index.insert(book("C", 1.0, 1.0)).unwrap();
        index.insert(book("A", 1.0, 1.0)).unwrap();
        let pos = index.insert(book("B", 1.0, 1.0)).unwrap();

        assert_eq!(pos, 1);
        let keys: Vec<&str> = index.keys().map(BookKey::as_str).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_insert_rejects_duplicate_and_allocated() {
        let mut index = AvailableIndex::new();
        index.insert(book("A", 1.0, 1.0)).unwrap();

        assert_eq!(
            index.insert(book("A", 2.0, 1.0)).unwrap_err(),
            IndexError::Duplicate(key("A"))
        );
        assert_eq!(
            index
                .insert(book("Z", 1.0, 1.0).with_allocated(true))
                .unwrap_err(),
            IndexError::Allocated(key("Z"))
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut index = AvailableIndex::from_books(vec![book("A", 1.0, 1.0), book("B", 1.0, 1.0)]);
        assert!(index.remove(&key("A")));
        assert!(!index.remove(&key("A")));
        assert!(!index.contains(&key("A")));
        assert!(index.contains(&key("B")));
    }

    #[test]
    fn test_from_books_skips_allocated_and_duplicates() {
        let index = AvailableIndex::from_books(vec![
            book("B", 1.0, 1.0),
            book("A", 1.0, 1.0).with_allocated(true),
            book("B", 9.0, 1.0),
            book("C", 1.0, 1.0),
        ]);

        let keys: Vec<&str> = index.keys().map(BookKey::as_str).collect();
        assert_eq!(keys, vec!["B", "C"]);
        assert_eq!(index.get(&key("B")).map(|b| b.weight), Some(1.0));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(Book),
        Remove(usize),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (arb_book(), any::<bool>())
                .prop_map(|(book, allocated)| Op::Insert(book.with_allocated(allocated))),
            any::<usize>().prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_index_stays_sorted_and_available(ops in prop::collection::vec(arb_op(), 0..64)) {
            let mut index = AvailableIndex::new();
            for op in ops {
                match op {
                    Op::Insert(book) => {
                        let _ = index.insert(book);
                    }
                    Op::Remove(n) => {
                        let target = index.keys().nth(n % (index.len() + 1)).cloned();
                        if let Some(k) = target {
                            prop_assert!(index.remove(&k));
                        }
                    }
                }
                let keys: Vec<&BookKey> = index.keys().collect();
                prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(index.iter().all(Book::is_available));
            }
        }
    }
}
