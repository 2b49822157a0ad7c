//! Books and shelves.

use serde::{Deserialize, Serialize};
use shelfmark_id::{BookKey, ShelfId};

use crate::PackingError;

// =============================================================================
// Book
// =============================================================================

/// A catalogued book.
///
/// `allocated` is the only source of truth for whether the book is out on
/// loan; the available index and the loan path both read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub key: BookKey,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Weight in the same unit as shelf capacity.
    pub weight: f64,
    /// Price or unit value.
    pub value: f64,
    #[serde(default)]
    pub allocated: bool,
}

impl Book {
    /// Creates an available book with no title or author.
    pub fn new(key: BookKey, weight: f64, value: f64) -> Self {
        Self {
            key,
            title: String::new(),
            author: String::new(),
            weight,
            value,
            allocated: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_allocated(mut self, allocated: bool) -> Self {
        self.allocated = allocated;
        self
    }

    /// Checks that weight and value are finite and non-negative.
    pub fn validate(&self) -> Result<(), PackingError> {
        if !(self.weight.is_finite() && self.weight >= 0.0) {
            return Err(PackingError::InvalidWeight {
                key: self.key.clone(),
                weight: self.weight,
            });
        }
        if !(self.value.is_finite() && self.value >= 0.0) {
            return Err(PackingError::InvalidValue {
                key: self.key.clone(),
                value: self.value,
            });
        }
        Ok(())
    }

    /// Returns true if the book may be handed to a new loan.
    pub fn is_available(&self) -> bool {
        !self.allocated
    }
}

// =============================================================================
// Shelf
// =============================================================================

/// A capacity-bounded container of books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelf {
    pub id: ShelfId,
    pub books: Vec<Book>,
    /// Sum of the weights of `books`.
    pub current_weight: f64,
    /// Set when the shelf holds a single book heavier than the capacity.
    pub over_capacity: bool,
}

impl Shelf {
    /// Creates an empty shelf.
    pub fn new(id: ShelfId) -> Self {
        Self {
            id,
            books: Vec::new(),
            current_weight: 0.0,
            over_capacity: false,
        }
    }

    /// Returns true if `book` can be added without exceeding `capacity`.
    pub fn fits(&self, book: &Book, capacity: f64) -> bool {
        self.current_weight + book.weight <= capacity
    }

    /// Adds a book and updates the running weight.
    pub fn push(&mut self, book: Book) {
        self.current_weight += book.weight;
        self.books.push(book);
    }

    /// Total value of the books on this shelf.
    pub fn value(&self) -> f64 {
        self.books.iter().map(|b| b.value).sum()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Returns true if the shelf holds the book with `key`.
    pub fn contains(&self, key: &BookKey) -> bool {
        self.books.iter().any(|b| &b.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn key(s: &str) -> BookKey {
        BookKey::parse(s).unwrap()
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(1.5, 12.0)]
    #[case(1000.0, 0.0)]
    fn test_validate_accepts_non_negative(#[case] weight: f64, #[case] value: f64) {
        assert!(Book::new(key("B1"), weight, value).validate().is_ok());
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_validate_rejects_bad_weight(#[case] weight: f64) {
        let err = Book::new(key("B1"), weight, 1.0).validate().unwrap_err();
        assert!(matches!(err, PackingError::InvalidWeight { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_validate_rejects_negative_value() {
        let err = Book::new(key("B1"), 1.0, -0.5).validate().unwrap_err();
        assert!(matches!(err, PackingError::InvalidValue { .. }));
    }

    #[test]
    fn test_shelf_tracks_running_weight() {
        let mut shelf = Shelf::new(ShelfId::FIRST);
        shelf.push(Book::new(key("A"), 3.0, 10.0));
        shelf.push(Book::new(key("B"), 4.0, 5.0));

        assert_eq!(shelf.current_weight, 7.0);
        assert_eq!(shelf.value(), 15.0);
        assert!(shelf.contains(&key("A")));
        assert!(!shelf.fits(&Book::new(key("C"), 0.5, 1.0), 7.0));
        assert!(shelf.fits(&Book::new(key("C"), 0.0, 1.0), 7.0));
    }

    #[test]
    fn test_book_builder() {
        let book = Book::new(key("978-0-306-40615-7"), 1.0, 20.0)
            .with_title("Dune")
            .with_author("Herbert")
            .with_allocated(true);
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Herbert");
        assert!(!book.is_available());
    }

    #[test]
    fn test_book_json_defaults_optional_fields() {
        let book: Book =
            serde_json::from_str(r#"{"key":"B1","weight":1.0,"value":2.0}"#).unwrap();
        assert!(book.title.is_empty());
        assert!(!book.allocated);
    }
}
