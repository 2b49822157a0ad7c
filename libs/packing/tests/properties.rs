//! Property tests for the packers.

use proptest::prelude::*;
use shelfmark_packing::{ExactPacker, GreedyPacker, Packer};
use shelfmark_testing::oracle::{brute_force_hazards, brute_force_knapsack};
use shelfmark_testing::strategies::{arb_books, arb_integral_books};

proptest! {
    #[test]
    fn prop_greedy_shelves_respect_capacity(
        books in arb_books(24),
        capacity in 1.0f64..20.0,
    ) {
        let arrangement = GreedyPacker::default().organize(&books, capacity).unwrap();

        for shelf in &arrangement.shelves {
            if shelf.over_capacity {
                prop_assert_eq!(shelf.len(), 1);
                prop_assert!(shelf.current_weight > capacity);
            } else {
                prop_assert!(shelf.current_weight <= capacity);
            }
        }
        let placed: usize = arrangement.shelves.iter().map(|s| s.len()).sum();
        prop_assert_eq!(placed, books.len());
        prop_assert!(arrangement.is_complete());
    }

    #[test]
    fn prop_greedy_hazards_match_brute_force(
        books in arb_integral_books(12),
        capacity in 1u8..25,
    ) {
        let capacity = f64::from(capacity);
        let packer = GreedyPacker::default();
        let hazards = packer.hazards(&books, capacity);
        let expected = brute_force_hazards(&books, capacity, true);

        for hazard in &hazards {
            prop_assert!(hazard.total_weight > capacity);
        }
        prop_assert_eq!(hazards.len(), expected.len());
        let pairs = hazards.iter().filter(|h| h.size() == 2).count();
        prop_assert_eq!(pairs, expected.iter().filter(|c| c.len() == 2).count());
    }

    #[test]
    fn prop_hazards_do_not_change_placement(
        books in arb_books(10),
        capacity in 1.0f64..20.0,
    ) {
        let packer = GreedyPacker::default();
        let arrangement = packer.organize(&books, capacity).unwrap();
        prop_assert_eq!(arrangement.shelves, packer.pack(&books, capacity));
    }

    #[test]
    fn prop_exact_matches_brute_force(
        books in arb_integral_books(10),
        capacity in 1u8..30,
    ) {
        let capacity = f64::from(capacity);
        let solution = ExactPacker::default().solve(&books, capacity).unwrap();
        prop_assert_eq!(solution.best_value, brute_force_knapsack(&books, capacity));

        let weight: f64 = solution.selected_indices().map(|i| books[i].weight).sum();
        prop_assert!(weight <= capacity);
    }
}
