//! Shelf packing for shelfmark.
//!
//! Two interchangeable strategies place a set of weighted books onto
//! capacity-bounded shelves:
//!
//! - [`GreedyPacker`]: first-fit bin packing in input order, plus a report
//!   of every pair (and, for small inputs, every triple) of books that
//!   would overflow a shelf together.
//! - [`ExactPacker`]: exhaustive 0/1 knapsack that fills a single shelf
//!   with the most valuable subset that fits.
//!
//! Both implement [`Packer`], so the circulation engine can pick one from
//! configuration.

mod arrangement;
mod error;
mod exact;
mod greedy;
mod model;

pub use arrangement::{Arrangement, HazardReport};
pub use error::PackingError;
pub use exact::{ExactPacker, KnapsackSolution, DEFAULT_EXACT_ITEM_LIMIT};
pub use greedy::{GreedyPacker, DEFAULT_HAZARD_TRIPLE_LIMIT};
pub use model::{Book, Shelf};

use serde::{Deserialize, Serialize};

/// Which packing algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackingStrategy {
    #[default]
    Greedy,
    Exact,
}

impl PackingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackingStrategy::Greedy => "greedy",
            PackingStrategy::Exact => "exact",
        }
    }
}

impl std::fmt::Display for PackingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PackingStrategy {
    type Err = PackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(PackingStrategy::Greedy),
            "exact" => Ok(PackingStrategy::Exact),
            other => Err(PackingError::UnknownStrategy(other.to_string())),
        }
    }
}

/// A packing algorithm.
pub trait Packer: Send + Sync {
    /// The strategy this packer implements.
    fn strategy(&self) -> PackingStrategy;

    /// Places `books` onto shelves of the given capacity.
    ///
    /// Hazard reports are diagnostic and never change placement.
    fn organize(&self, books: &[Book], capacity: f64) -> Result<Arrangement, PackingError>;
}
