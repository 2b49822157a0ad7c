//! Loans and the loan ledger.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelfmark_events::TerminationReason;
use shelfmark_id::{BookKey, LoanId, RequesterId};

/// One requester holding one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub holder: RequesterId,
    pub book: BookKey,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<TerminationReason>,
}

impl Loan {
    /// Opens a new active loan.
    pub fn new(holder: RequesterId, book: BookKey) -> Self {
        Self {
            id: LoanId::new(),
            holder,
            book,
            active: true,
            created_at: Utc::now(),
            ended_at: None,
            end_reason: None,
        }
    }

    fn close(mut self, reason: TerminationReason) -> Self {
        self.active = false;
        self.ended_at = Some(Utc::now());
        self.end_reason = Some(reason);
        self
    }
}

/// Active loans by ID and ended loans by holder.
#[derive(Debug, Clone, Default)]
pub struct LoanLedger {
    active: BTreeMap<LoanId, Loan>,
    history: HashMap<RequesterId, Vec<Loan>>,
}

impl LoanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, loan: Loan) {
        self.active.insert(loan.id, loan);
    }

    /// Ends an active loan and moves it to its holder's history.
    pub fn close(&mut self, id: LoanId, reason: TerminationReason) -> Option<Loan> {
        let ended = self.active.remove(&id)?.close(reason);
        self.history
            .entry(ended.holder)
            .or_default()
            .push(ended.clone());
        Some(ended)
    }

    pub fn get(&self, id: LoanId) -> Option<&Loan> {
        self.active.get(&id)
    }

    /// Active loan on `book`, if any.
    pub fn for_book(&self, book: &BookKey) -> Option<&Loan> {
        self.active.values().find(|l| &l.book == book)
    }

    /// Active loans held by `holder`, ordered by loan ID.
    pub fn active_for(&self, holder: &RequesterId) -> Vec<Loan> {
        self.active
            .values()
            .filter(|l| &l.holder == holder)
            .cloned()
            .collect()
    }

    /// Ended loans of `holder`, in the order they ended.
    pub fn history_for(&self, holder: &RequesterId) -> &[Loan] {
        self.history
            .get(holder)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmark_testing::key;

    #[test]
    fn test_close_moves_loan_to_history() {
        let mut ledger = LoanLedger::new();
        let holder = RequesterId::new();
        let loan = Loan::new(holder, key("B1"));
        let id = loan.id;
        ledger.open(loan);
        assert_eq!(ledger.active_for(&holder).len(), 1);
        assert!(ledger.for_book(&key("B1")).is_some());

        let ended = ledger.close(id, TerminationReason::Returned).unwrap();
        assert!(!ended.active);
        assert_eq!(ended.end_reason, Some(TerminationReason::Returned));
        assert!(ended.ended_at.is_some());

        assert!(ledger.get(id).is_none());
        assert_eq!(ledger.history_for(&holder), &[ended]);
        assert_eq!(ledger.active_count(), 0);
    }

    #[test]
    fn test_close_unknown_loan() {
        let mut ledger = LoanLedger::new();
        assert!(ledger.close(LoanId::new(), TerminationReason::Deleted).is_none());
        assert!(ledger.history_for(&RequesterId::new()).is_empty());
    }

    #[test]
    fn test_active_loan_json_omits_end_fields() {
        let loan = Loan::new(RequesterId::new(), key("B1"));
        let json = serde_json::to_value(&loan).unwrap();
        assert_eq!(json["active"], true);
        assert!(json.get("ended_at").is_none());
    }
}
