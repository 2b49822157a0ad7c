//! Exact single-shelf packing as a 0/1 knapsack.

use serde::{Deserialize, Serialize};
use shelfmark_id::ShelfId;
use tracing::debug;

use crate::error::check_capacity;
use crate::{Arrangement, Book, Packer, PackingError, PackingStrategy, Shelf};

/// Default maximum number of books the exhaustive search accepts.
pub const DEFAULT_EXACT_ITEM_LIMIT: usize = 15;

/// Best selection found by [`ExactPacker::solve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnapsackSolution {
    pub best_value: f64,
    /// `selection[i]` is true when `books[i]` is on the shelf.
    pub selection: Vec<bool>,
}

impl KnapsackSolution {
    /// Indices of the selected books.
    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.selection
            .iter()
            .enumerate()
            .filter_map(|(i, selected)| selected.then_some(i))
    }
}

/// Exhaustive 0/1 knapsack over one shelf.
///
/// Each book is decided in input order, excluding it before trying to
/// include it. A branch that would push the running weight over the
/// capacity is pruned. The incumbent is only replaced by a strictly
/// greater value, so among equal-value selections the first one reached
/// in that order wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactPacker {
    max_items: usize,
}

impl ExactPacker {
    pub fn new(max_items: usize) -> Self {
        Self { max_items }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Finds the most valuable subset of `books` that fits in `capacity`.
    pub fn solve(&self, books: &[Book], capacity: f64) -> Result<KnapsackSolution, PackingError> {
        check_capacity(capacity)?;
        if books.len() > self.max_items {
            return Err(PackingError::TooManyItems {
                count: books.len(),
                limit: self.max_items,
            });
        }
        for book in books {
            book.validate()?;
        }

        let mut search = Search {
            books,
            capacity,
            current: vec![false; books.len()],
            best: KnapsackSolution {
                best_value: 0.0,
                selection: vec![false; books.len()],
            },
            leaves: 0,
        };
        search.descend(0, 0.0, 0.0);

        debug!(
            books = books.len(),
            leaves = search.leaves,
            best_value = search.best.best_value,
            "knapsack search complete"
        );
        Ok(search.best)
    }
}

impl Default for ExactPacker {
    fn default() -> Self {
        Self::new(DEFAULT_EXACT_ITEM_LIMIT)
    }
}

impl Packer for ExactPacker {
    fn strategy(&self) -> PackingStrategy {
        PackingStrategy::Exact
    }

    fn organize(&self, books: &[Book], capacity: f64) -> Result<Arrangement, PackingError> {
        let solution = self.solve(books, capacity)?;

        let mut shelf = Shelf::new(ShelfId::FIRST);
        let mut unplaced = Vec::new();
        for (book, selected) in books.iter().zip(&solution.selection) {
            if *selected {
                shelf.push(book.clone());
            } else {
                unplaced.push(book.clone());
            }
        }

        let shelves = if shelf.is_empty() { Vec::new() } else { vec![shelf] };
        Ok(Arrangement {
            shelves,
            unplaced,
            ..Arrangement::empty(PackingStrategy::Exact, capacity)
        })
    }
}

// =============================================================================
// Search
// =============================================================================

struct Search<'a> {
    books: &'a [Book],
    capacity: f64,
    current: Vec<bool>,
    best: KnapsackSolution,
    leaves: u64,
}

impl Search<'_> {
    // Depth is bounded by `ExactPacker::max_items`.
    fn descend(&mut self, index: usize, weight: f64, value: f64) {
        if index == self.books.len() {
            self.leaves += 1;
            if value > self.best.best_value {
                self.best.best_value = value;
                self.best.selection.clone_from(&self.current);
            }
            return;
        }

        self.descend(index + 1, weight, value);

        let book = &self.books[index];
        if weight + book.weight <= self.capacity {
            self.current[index] = true;
            self.descend(index + 1, weight + book.weight, value + book.value);
            self.current[index] = false;
        }
    }
}
