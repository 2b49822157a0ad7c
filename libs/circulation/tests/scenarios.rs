//! End-to-end circulation scenarios.

use shelfmark_circulation::memory::{MemoryDirectory, MemoryItemStore, MemoryLoanStore};
use shelfmark_circulation::{
    AllocationOutcome, Circulation, EngineConfig, HandoffOutcome, ItemStore, ReorganizeTrigger,
    ReplaceOutcome, TerminationReason,
};
use shelfmark_packing::{GreedyPacker, Packer};
use shelfmark_testing::{book, books_with_weights, key};

fn engine(books: Vec<shelfmark_packing::Book>) -> (Circulation, MemoryItemStore, MemoryDirectory) {
    let items = MemoryItemStore::with_books(books);
    let directory = MemoryDirectory::new();
    let engine = Circulation::new(
        &EngineConfig::default(),
        items.clone(),
        MemoryLoanStore::new(),
        directory.clone(),
    )
    .unwrap();
    (engine, items, directory)
}

#[test]
fn test_return_hands_book_to_first_waiter() {
    let (mut engine, items, directory) = engine(vec![book("B1", 1.0, 15.0)]);
    let u1 = directory.register().unwrap();
    let u2 = directory.register().unwrap();

    let AllocationOutcome::Allocated(loan) = engine.create(u1, &key("B1")).unwrap() else {
        panic!("B1 should be available");
    };

    let queued = engine.create(u2, &key("B1")).unwrap();
    assert_eq!(queued.position().map(|p| p.position), Some(0));

    let report = engine.terminate(loan.id, TerminationReason::Returned).unwrap();

    let handed = report
        .handoff
        .as_ref()
        .and_then(HandoffOutcome::granted)
        .expect("B1 should be handed to U2");
    assert_eq!(handed.holder, u2);
    assert_eq!(handed.book, key("B1"));
    assert!(!engine.index().contains(&key("B1")));
    assert!(!engine.registry().has_waiters(&key("B1")));
    assert!(items.get(&key("B1")).unwrap().unwrap().allocated);
}

#[test]
fn test_greedy_packing_of_three_books() {
    let books = books_with_weights(&[3.0, 4.0, 5.0]);
    let arrangement = GreedyPacker::default().organize(&books, 7.0).unwrap();

    let shelves: Vec<Vec<f64>> = arrangement
        .shelves
        .iter()
        .map(|s| s.books.iter().map(|b| b.weight).collect())
        .collect();
    assert_eq!(shelves, vec![vec![3.0, 4.0], vec![5.0]]);

    let pair = arrangement
        .hazards
        .iter()
        .find(|h| h.combination == vec![key("B0"), key("B2")])
        .unwrap();
    assert_eq!(pair.total_weight, 8.0);
    assert!(pair.total_weight > 7.0);
}

#[test]
fn test_greedy_packing_through_engine() {
    let config = EngineConfig {
        shelf_capacity: 7.0,
        ..EngineConfig::default()
    };
    let items = MemoryItemStore::with_books(books_with_weights(&[3.0, 4.0, 5.0]));
    let mut engine =
        Circulation::new(&config, items, MemoryLoanStore::new(), MemoryDirectory::new()).unwrap();

    let arrangement = engine.reorganize(ReorganizeTrigger::Manual).unwrap();

    assert_eq!(arrangement.shelf_count(), 2);
    assert_eq!(arrangement.shelves[0].current_weight, 7.0);
    assert_eq!(arrangement.hazards.len(), 3);
}

#[test]
fn test_replace_with_book_on_loan_keeps_release() {
    let (mut engine, items, directory) = engine(vec![book("B1", 1.0, 10.0), book("B2", 1.0, 10.0)]);
    let u1 = directory.register().unwrap();
    let other = directory.register().unwrap();
    let waiter = directory.register().unwrap();

    let loan = engine.create(u1, &key("B1")).unwrap().loan().cloned().unwrap();
    engine.create(other, &key("B2")).unwrap();
    engine.create(waiter, &key("B1")).unwrap();

    let outcome = engine.replace(loan.id, &key("B2")).unwrap();

    let ReplaceOutcome::NewItemUnavailable { release, position } = outcome else {
        panic!("B2 is on loan, replacement must not succeed");
    };
    assert_eq!(release.ended.id, loan.id);
    assert_eq!(release.ended.end_reason, Some(TerminationReason::Replaced));
    assert_eq!(position.book, key("B2"));
    assert_eq!(position.position, 0);

    // The old book was released and handed to its waiter.
    let handed = release.handoff.as_ref().and_then(HandoffOutcome::granted).unwrap();
    assert_eq!(handed.holder, waiter);
    assert!(items.get(&key("B1")).unwrap().unwrap().allocated);

    // The requester holds nothing and waits for B2.
    assert!(engine.active_loans_for(&u1).is_empty());
    assert_eq!(engine.registry().waiters(&key("B2")), vec![u1]);
}

#[test]
fn test_replace_without_waiters_leaves_old_book_available() {
    let (mut engine, _items, directory) = engine(vec![book("B1", 1.0, 10.0), book("B2", 1.0, 10.0)]);
    let u1 = directory.register().unwrap();
    let other = directory.register().unwrap();

    let loan = engine.create(u1, &key("B1")).unwrap().loan().cloned().unwrap();
    engine.create(other, &key("B2")).unwrap();

    let outcome = engine.replace(loan.id, &key("B2")).unwrap();

    assert!(!outcome.is_replaced());
    assert!(outcome.release().handoff.is_none());
    assert!(engine.index().contains(&key("B1")));
}
