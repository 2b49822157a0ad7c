//! Proptest strategies.

use proptest::prelude::*;
use shelfmark_id::BookKey;
use shelfmark_packing::Book;

/// Short alphanumeric book keys, so generated sequences collide often.
pub fn arb_book_key() -> impl Strategy<Value = BookKey> {
    "[A-D][0-9]{1,2}".prop_map(|s| BookKey::parse(&s).unwrap_or_else(|e| panic!("{e}")))
}

/// Books with weights in `0.0..10.0` and values in `0.0..50.0`.
pub fn arb_book() -> impl Strategy<Value = Book> {
    (arb_book_key(), 0.0f64..10.0, 0.0f64..50.0)
        .prop_map(|(key, weight, value)| Book::new(key, weight, value))
}

/// Up to `max` books; keys may repeat.
pub fn arb_books(max: usize) -> impl Strategy<Value = Vec<Book>> {
    prop::collection::vec(arb_book(), 0..=max)
}

/// Books with integral weights, which keeps weight sums exact.
pub fn arb_integral_books(max: usize) -> impl Strategy<Value = Vec<Book>> {
    prop::collection::vec((arb_book_key(), 0u8..10, 0u8..50), 0..=max).prop_map(|items| {
        items
            .into_iter()
            .map(|(key, w, v)| Book::new(key, f64::from(w), f64::from(v)))
            .collect()
    })
}
