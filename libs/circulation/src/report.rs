//! Inventory value reports.

use serde::{Deserialize, Serialize};
use shelfmark_id::BookKey;
use shelfmark_packing::Book;

/// Sort direction for [`value_report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrder {
    #[default]
    Descending,
    Ascending,
}

/// One row of a value report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueLine {
    pub key: BookKey,
    pub title: String,
    pub author: String,
    pub value: f64,
    pub allocated: bool,
}

/// Every book ordered by value, with the inventory total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueReport {
    pub order: ValueOrder,
    pub lines: Vec<ValueLine>,
    pub total_value: f64,
}

impl ValueReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Orders `books` by value. Books with equal value keep their input order.
pub fn value_report(books: &[Book], order: ValueOrder) -> ValueReport {
    let mut lines: Vec<ValueLine> = books
        .iter()
        .map(|b| ValueLine {
            key: b.key.clone(),
            title: b.title.clone(),
            author: b.author.clone(),
            value: b.value,
            allocated: b.allocated,
        })
        .collect();

    match order {
        ValueOrder::Descending => lines.sort_by(|a, b| b.value.total_cmp(&a.value)),
        ValueOrder::Ascending => lines.sort_by(|a, b| a.value.total_cmp(&b.value)),
    }

    let total_value = lines.iter().map(|l| l.value).sum();
    ValueReport {
        order,
        lines,
        total_value,
    }
}

/// Count, total value and average weight of one author's books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub author: String,
    pub book_count: usize,
    pub total_value: f64,
    /// Zero when the author has no books.
    pub average_weight: f64,
}

impl AuthorSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Summarises the books whose author matches `author` exactly.
pub fn author_summary(books: &[Book], author: &str) -> AuthorSummary {
    let (count, weight, value) = books
        .iter()
        .filter(|b| b.author == author)
        .fold((0usize, 0.0, 0.0), |(n, w, v), b| (n + 1, w + b.weight, v + b.value));

    AuthorSummary {
        author: author.to_string(),
        book_count: count,
        total_value: value,
        average_weight: if count == 0 { 0.0 } else { weight / count as f64 },
    }
}
