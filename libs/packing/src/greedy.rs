//! First-fit shelf packing with hazard analysis.

use shelfmark_id::ShelfId;
use tracing::{debug, warn};

use crate::error::check_capacity;
use crate::{Arrangement, Book, HazardReport, Packer, PackingError, PackingStrategy, Shelf};

/// Default input size up to which triples are checked for hazards.
pub const DEFAULT_HAZARD_TRIPLE_LIMIT: usize = 15;

/// First-fit packer.
///
/// Shelves are filled in input order: the first unplaced book opens a
/// shelf, then every later unplaced book that still fits is added to it.
/// A book heavier than the capacity gets a flagged shelf of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreedyPacker {
    hazard_triple_limit: usize,
}

impl GreedyPacker {
    /// Creates a packer that checks triples when there are at most
    /// `hazard_triple_limit` books.
    pub fn new(hazard_triple_limit: usize) -> Self {
        Self {
            hazard_triple_limit,
        }
    }

    pub fn hazard_triple_limit(&self) -> usize {
        self.hazard_triple_limit
    }

    /// Packs `books` into shelves without hazard analysis.
    pub fn pack(&self, books: &[Book], capacity: f64) -> Vec<Shelf> {
        let mut placed = vec![false; books.len()];
        let mut shelves = Vec::new();
        let mut next_id = ShelfId::FIRST;

        for i in 0..books.len() {
            if placed[i] {
                continue;
            }
            placed[i] = true;

            let mut shelf = Shelf::new(next_id);
            shelf.push(books[i].clone());

            if books[i].weight > capacity {
                shelf.over_capacity = true;
                debug!(book = %books[i].key, weight = books[i].weight, "book exceeds shelf capacity");
            } else {
                for j in (i + 1)..books.len() {
                    if !placed[j] && shelf.fits(&books[j], capacity) {
                        shelf.push(books[j].clone());
                        placed[j] = true;
                    }
                }
            }

            shelves.push(shelf);
            next_id = next_id.next();
        }

        shelves
    }

    /// Lists every pair, and every triple when the input is small enough,
    /// whose summed weight is strictly greater than `capacity`.
    pub fn hazards(&self, books: &[Book], capacity: f64) -> Vec<HazardReport> {
        let n = books.len();
        let mut hazards = Vec::new();

        for i in 0..n {
            for j in (i + 1)..n {
                let total = books[i].weight + books[j].weight;
                if total > capacity {
                    hazards.push(HazardReport {
                        combination: vec![books[i].key.clone(), books[j].key.clone()],
                        total_weight: total,
                    });
                }
            }
        }

        if n <= self.hazard_triple_limit {
            for i in 0..n {
                for j in (i + 1)..n {
                    for k in (j + 1)..n {
                        let total = books[i].weight + books[j].weight + books[k].weight;
                        if total > capacity {
                            hazards.push(HazardReport {
                                combination: vec![
                                    books[i].key.clone(),
                                    books[j].key.clone(),
                                    books[k].key.clone(),
                                ],
                                total_weight: total,
                            });
                        }
                    }
                }
            }
        } else {
            debug!(
                books = n,
                limit = self.hazard_triple_limit,
                "skipping triple hazard analysis"
            );
        }

        hazards
    }
}

impl Default for GreedyPacker {
    fn default() -> Self {
        Self::new(DEFAULT_HAZARD_TRIPLE_LIMIT)
    }
}

impl Packer for GreedyPacker {
    fn strategy(&self) -> PackingStrategy {
        PackingStrategy::Greedy
    }

    fn organize(&self, books: &[Book], capacity: f64) -> Result<Arrangement, PackingError> {
        check_capacity(capacity)?;
        for book in books {
            book.validate()?;
        }

        let shelves = self.pack(books, capacity);
        let hazards = self.hazards(books, capacity);

        if !hazards.is_empty() {
            warn!(hazards = hazards.len(), capacity, "dangerous combinations found");
        }
        debug!(books = books.len(), shelves = shelves.len(), "greedy packing complete");

        Ok(Arrangement {
            shelves,
            hazards,
            ..Arrangement::empty(PackingStrategy::Greedy, capacity)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use shelfmark_id::BookKey;

    fn books(weights: &[f64]) -> Vec<Book> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| Book::new(BookKey::parse(&format!("B{i}")).unwrap(), *w, 1.0))
            .collect()
    }

    fn weights(shelf: &Shelf) -> Vec<f64> {
        shelf.books.iter().map(|b| b.weight).collect()
    }

    #[test]
    fn test_first_fit_follows_input_order() {
        let arrangement = GreedyPacker::default()
            .organize(&books(&[3.0, 4.0, 5.0]), 7.0)
            .unwrap();

        assert_eq!(arrangement.shelf_count(), 2);
        assert_eq!(weights(&arrangement.shelves[0]), vec![3.0, 4.0]);
        assert_eq!(weights(&arrangement.shelves[1]), vec![5.0]);
        assert!(arrangement.is_complete());
    }

    #[test]
    fn test_hazards_for_small_input() {
        let arrangement = GreedyPacker::default()
            .organize(&books(&[3.0, 4.0, 5.0]), 7.0)
            .unwrap();

        let totals: Vec<f64> = arrangement.hazards.iter().map(|h| h.total_weight).collect();
        // (3,4) sums to exactly 7 and is not a hazard.
        assert_eq!(totals, vec![8.0, 9.0, 12.0]);
        assert_eq!(
            arrangement.hazards[0].combination,
            vec![BookKey::parse("B0").unwrap(), BookKey::parse("B2").unwrap()]
        );
    }

    #[test]
    fn test_later_book_fills_gap_on_earlier_shelf() {
        let arrangement = GreedyPacker::default()
            .organize(&books(&[5.0, 4.0, 2.0]), 7.0)
            .unwrap();

        assert_eq!(weights(&arrangement.shelves[0]), vec![5.0, 2.0]);
        assert_eq!(weights(&arrangement.shelves[1]), vec![4.0]);
    }

    #[test]
    fn test_over_capacity_book_gets_flagged_shelf() {
        let arrangement = GreedyPacker::default()
            .organize(&books(&[9.0, 1.0, 2.0]), 7.0)
            .unwrap();

        assert_eq!(arrangement.shelf_count(), 2);
        assert!(arrangement.shelves[0].over_capacity);
        assert_eq!(weights(&arrangement.shelves[0]), vec![9.0]);
        assert_eq!(weights(&arrangement.shelves[1]), vec![1.0, 2.0]);
        assert_eq!(arrangement.over_capacity_shelves().count(), 1);
    }

    #[test]
    fn test_triples_skipped_above_limit() {
        let packer = GreedyPacker::new(2);
        let hazards = packer.hazards(&books(&[3.0, 3.0, 3.0]), 7.0);
        assert!(hazards.is_empty());

        let hazards = GreedyPacker::new(3).hazards(&books(&[3.0, 3.0, 3.0]), 7.0);
        assert_eq!(hazards.len(), 1);
        assert_eq!(hazards[0].size(), 3);
    }

    #[test]
    fn test_empty_input() {
        let arrangement = GreedyPacker::default().organize(&[], 7.0).unwrap();
        assert_eq!(arrangement.shelf_count(), 0);
        assert!(arrangement.hazards.is_empty());
    }

    #[rstest]
    #[case(0.0)]
    #[case(-3.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_rejects_invalid_capacity(#[case] capacity: f64) {
        let err = GreedyPacker::default()
            .organize(&books(&[1.0]), capacity)
            .unwrap_err();
        assert!(matches!(err, PackingError::InvalidCapacity(_)));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let err = GreedyPacker::default()
            .organize(&books(&[1.0, -2.0]), 7.0)
            .unwrap_err();
        assert!(matches!(err, PackingError::InvalidWeight { .. }));
    }
}
