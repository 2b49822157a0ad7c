//! Brute-force reference implementations.

use shelfmark_packing::Book;

/// Best knapsack value by enumerating all `2^n` subsets.
///
/// Intended for `n <= 20`.
pub fn brute_force_knapsack(books: &[Book], capacity: f64) -> f64 {
    let n = books.len();
    let mut best = 0.0;
    for mask in 0u32..(1u32 << n) {
        let mut weight = 0.0;
        let mut value = 0.0;
        for (i, book) in books.iter().enumerate() {
            if mask & (1 << i) != 0 {
                weight += book.weight;
                value += book.value;
            }
        }
        if weight <= capacity && value > best {
            best = value;
        }
    }
    best
}

/// Index combinations of size 2, and size 3 when `include_triples`,
/// whose summed weight exceeds `capacity`.
pub fn brute_force_hazards(books: &[Book], capacity: f64, include_triples: bool) -> Vec<Vec<usize>> {
    let n = books.len();
    let mut out = Vec::new();
    for mask in 0u32..(1u32 << n) {
        let size = mask.count_ones();
        if size == 2 || (include_triples && size == 3) {
            let members: Vec<usize> = (0..n).filter(|i| mask & (1 << i) != 0).collect();
            let total: f64 = members.iter().map(|&i| books[i].weight).sum();
            if total > capacity {
                out.push(members);
            }
        }
    }
    out
}
