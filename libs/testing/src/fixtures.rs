//! Fixture constructors.

use shelfmark_id::BookKey;
use shelfmark_packing::Book;

/// Parses a book key, panicking on invalid input.
pub fn key(s: &str) -> BookKey {
    match BookKey::parse(s) {
        Ok(key) => key,
        Err(e) => panic!("invalid fixture key {s:?}: {e}"),
    }
}

/// An available book.
pub fn book(k: &str, weight: f64, value: f64) -> Book {
    Book::new(key(k), weight, value)
}

/// Books keyed `B0`, `B1`, ... with the given weights and unit value.
pub fn books_with_weights(weights: &[f64]) -> Vec<Book> {
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| book(&format!("B{i}"), *w, 1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_books_with_weights_keys_in_order() {
        let books = books_with_weights(&[1.0, 2.0]);
        assert_eq!(books[0].key.as_str(), "B0");
        assert_eq!(books[1].weight, 2.0);
    }
}
