//! Packing results.

use serde::{Deserialize, Serialize};
use shelfmark_id::BookKey;

use crate::{Book, PackingStrategy, Shelf};

/// A combination of books whose combined weight exceeds the capacity.
///
/// Diagnostic only; hazards never influence placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardReport {
    /// Keys of the combined books, in input order.
    pub combination: Vec<BookKey>,
    pub total_weight: f64,
}

impl HazardReport {
    /// How far the combination exceeds `capacity`.
    pub fn excess(&self, capacity: f64) -> f64 {
        self.total_weight - capacity
    }

    /// Number of books in the combination.
    pub fn size(&self) -> usize {
        self.combination.len()
    }
}

/// The output of one packing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrangement {
    pub strategy: PackingStrategy,
    pub capacity: f64,
    pub shelves: Vec<Shelf>,
    pub hazards: Vec<HazardReport>,
    /// Books the strategy chose not to place.
    pub unplaced: Vec<Book>,
}

impl Arrangement {
    /// An arrangement with no shelves.
    pub fn empty(strategy: PackingStrategy, capacity: f64) -> Self {
        Self {
            strategy,
            capacity,
            shelves: Vec::new(),
            hazards: Vec::new(),
            unplaced: Vec::new(),
        }
    }

    pub fn shelf_count(&self) -> usize {
        self.shelves.len()
    }

    /// Total weight of placed books.
    pub fn placed_weight(&self) -> f64 {
        self.shelves.iter().map(|s| s.current_weight).sum()
    }

    /// Total value of placed books.
    pub fn placed_value(&self) -> f64 {
        self.shelves.iter().map(Shelf::value).sum()
    }

    /// Returns true if every input book was placed.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Shelves that hold a single book heavier than the capacity.
    pub fn over_capacity_shelves(&self) -> impl Iterator<Item = &Shelf> {
        self.shelves.iter().filter(|s| s.over_capacity)
    }

    /// Finds the shelf holding `key`.
    pub fn shelf_of(&self, key: &BookKey) -> Option<&Shelf> {
        self.shelves.iter().find(|s| s.contains(key))
    }
}
