//! Tests for the single-writer service handle.

use shelfmark_circulation::memory::{MemoryDirectory, MemoryItemStore, MemoryLoanStore};
use shelfmark_circulation::{
    Circulation, CirculationError, CirculationService, EngineConfig, ReorganizeTrigger,
    ServiceError, TerminationReason,
};
use shelfmark_events::event_types;
use shelfmark_testing::{book, key};

fn spawn() -> (shelfmark_circulation::CirculationHandle, MemoryDirectory) {
    let directory = MemoryDirectory::new();
    let engine = Circulation::new(
        &EngineConfig::default(),
        MemoryItemStore::with_books(vec![book("B1", 1.0, 10.0), book("B2", 2.0, 5.0)]),
        MemoryLoanStore::new(),
        directory.clone(),
    )
    .unwrap();
    (CirculationService::spawn(engine, 4), directory)
}

#[tokio::test]
async fn test_handle_round_trip() {
    let (handle, directory) = spawn();
    let u1 = directory.register().unwrap();
    let u2 = directory.register().unwrap();

    let loan = handle
        .create(u1, key("B1"))
        .await
        .unwrap()
        .loan()
        .cloned()
        .unwrap();
    let queued = handle.create(u2, key("B1")).await.unwrap();
    assert_eq!(queued.position().map(|p| p.position), Some(0));

    let available = handle.available().await.unwrap();
    assert_eq!(available.len(), 1);

    let report = handle
        .terminate(loan.id, TerminationReason::Returned)
        .await
        .unwrap();
    assert_eq!(report.handoff.unwrap().granted().map(|l| l.holder), Some(u2));

    let arrangement = handle.reorganize(ReorganizeTrigger::Manual).await.unwrap();
    assert_eq!(arrangement.shelf_count(), 1);

    let events = handle.drain_events().await.unwrap();
    assert_eq!(
        events.last().map(|e| e.event_type.as_str()),
        Some(event_types::BOOKCASE_REORGANIZED)
    );
}

#[tokio::test]
async fn test_handle_surfaces_engine_errors() {
    let (handle, directory) = spawn();
    let u1 = directory.register().unwrap();

    let err = handle.create(u1, key("B9")).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Circulation(CirculationError::UnknownItem(_))
    ));
}

#[tokio::test]
async fn test_concurrent_creates_lend_once() {
    let (handle, directory) = spawn();
    let requesters: Vec<_> = (0..8).map(|_| directory.register().unwrap()).collect();

    let tasks: Vec<_> = requesters
        .iter()
        .map(|&r| {
            let handle = handle.clone();
            tokio::spawn(async move { handle.create(r, key("B2")).await })
        })
        .collect();

    let mut allocated = 0;
    let mut positions = Vec::new();
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        match outcome.position() {
            Some(p) => positions.push(p.position),
            None => allocated += 1,
        }
    }
    positions.sort_unstable();

    assert_eq!(allocated, 1);
    assert_eq!(positions, (0..7).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_shutdown_returns_engine() {
    let (handle, directory) = spawn();
    let u1 = directory.register().unwrap();
    handle.create(u1, key("B1")).await.unwrap();

    let engine = handle.shutdown().await.unwrap();
    assert_eq!(engine.active_loans_for(&u1).len(), 1);

    assert!(matches!(
        handle.available().await.unwrap_err(),
        ServiceError::Stopped
    ));
    assert!(handle.is_closed());
}

#[tokio::test]
async fn test_cancel_reservations_through_handle() {
    let (handle, directory) = spawn();
    let u1 = directory.register().unwrap();
    let u2 = directory.register().unwrap();
    handle.create(u1, key("B1")).await.unwrap();
    handle.create(u2, key("B1")).await.unwrap();

    let cancelled = handle.cancel_reservations(u2).await.unwrap();
    assert_eq!(cancelled, vec![key("B1")]);

    assert_eq!(handle.sync_item(key("B1")).await.unwrap(), None);
}
