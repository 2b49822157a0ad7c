//! Typed identifier definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::IdError;

// =============================================================================
// People and Loans
// =============================================================================

define_id!(
    /// Identifies a patron who can hold loans and reservations.
    RequesterId,
    "usr"
);
define_id!(
    /// Identifies one loan, from creation until it is ended.
    LoanId,
    "loan"
);

// =============================================================================
// Book Keys
// =============================================================================

/// Catalogue key of a book, typically an ISBN.
///
/// Keys are case-sensitive and ordered lexicographically; the available
/// index is sorted by this ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookKey(String);

impl BookKey {
    pub const MAX_LEN: usize = 64;

    /// Accepts ASCII letters, digits, `-`, `_` and `.`. Surrounding
    /// whitespace is rejected rather than trimmed so keys stay byte-exact.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        Self::try_from(raw.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn book_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

impl TryFrom<String> for BookKey {
    type Error = IdError;

    fn try_from(raw: String) -> Result<Self, IdError> {
        if raw.is_empty() {
            return Err(IdError::Empty);
        }
        if raw.len() > Self::MAX_LEN {
            return Err(IdError::InvalidBookKey {
                reason: format!("longer than {} bytes", Self::MAX_LEN),
            });
        }
        match raw.chars().find(|&c| !book_key_char(c)) {
            Some(bad) => Err(IdError::InvalidBookKey {
                reason: format!("contains invalid character {bad:?}"),
            }),
            None => Ok(BookKey(raw)),
        }
    }
}

impl From<BookKey> for String {
    fn from(key: BookKey) -> String {
        key.0
    }
}

impl fmt::Display for BookKey {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        out.write_str(&self.0)
    }
}

impl FromStr for BookKey {
    type Err = IdError;

    fn from_str(raw: &str) -> Result<Self, IdError> {
        BookKey::parse(raw)
    }
}

impl AsRef<str> for BookKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Ordinals
// =============================================================================

/// Shelf number within one arrangement, starting at 1. Shown as `shelf-001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShelfId(u32);

/// Position of an event in the engine's journal. Assigned by a counter, so
/// it restarts with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(i64);

/// Per-book (or per-bookcase) event counter, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateSeq(i32);

impl ShelfId {
    pub const FIRST: ShelfId = ShelfId(1);

    #[must_use]
    pub const fn new(ordinal: u32) -> Self {
        ShelfId(ordinal)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn next(&self) -> Self {
        ShelfId(self.0 + 1)
    }
}

impl fmt::Display for ShelfId {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "shelf-{:03}", self.0)
    }
}

impl EventId {
    #[must_use]
    pub const fn new(position: i64) -> Self {
        EventId(position)
    }

    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "#{}", self.0)
    }
}

impl AggregateSeq {
    pub const FIRST: AggregateSeq = AggregateSeq(1);

    #[must_use]
    pub const fn new(seq: i32) -> Self {
        AggregateSeq(seq)
    }

    pub const fn value(&self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn next(&self) -> Self {
        AggregateSeq(self.0 + 1)
    }
}

impl Default for AggregateSeq {
    fn default() -> Self {
        AggregateSeq::FIRST
    }
}

impl fmt::Display for AggregateSeq {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, out)
    }
}

// =============================================================================
// Tests
// =============================================================================
