//! Test support for shelfmark crates.
//!
//! - [`fixtures`]: terse constructors for keys and books.
//! - [`strategies`]: proptest strategies for books and key sequences.
//! - [`oracle`]: brute-force reference answers for the packers.

pub mod fixtures;
pub mod oracle;
pub mod strategies;

pub use fixtures::{book, books_with_weights, key};
