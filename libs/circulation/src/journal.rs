//! In-process event journal.
//!
//! The engine records each applied transition here; the surrounding layer
//! drains and persists them.

use std::collections::HashMap;

use shelfmark_events::{ActorType, AggregateType, CirculationEvent, EventEnvelope};
use shelfmark_id::{AggregateSeq, EventId, RequesterId};
use tracing::error;

/// A journaled circulation event.
pub type JournalEntry = EventEnvelope<CirculationEvent>;

/// Aggregate ID used for bookcase events.
pub const BOOKCASE_AGGREGATE_ID: &str = "bookcase";

/// Actor ID used for transitions the engine performs on its own.
pub const ENGINE_ACTOR_ID: &str = "engine";

/// Who triggered a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Requester(RequesterId),
    System,
}

impl Actor {
    fn parts(&self) -> (ActorType, String) {
        match self {
            Actor::Requester(id) => (ActorType::Requester, id.to_string()),
            Actor::System => (ActorType::System, ENGINE_ACTOR_ID.to_string()),
        }
    }
}

/// Buffer of not-yet-drained events.
#[derive(Debug, Default)]
pub struct Journal {
    last_event_id: i64,
    sequences: HashMap<(AggregateType, String), AggregateSeq>,
    pending: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event and returns its ID.
    pub fn record(
        &mut self,
        event: CirculationEvent,
        actor: Actor,
        causation: Option<EventId>,
    ) -> Option<EventId> {
        let (aggregate_type, aggregate_id) = match event.book() {
            Some(book) => (AggregateType::Book, book.to_string()),
            None => (AggregateType::Bookcase, BOOKCASE_AGGREGATE_ID.to_string()),
        };

        let seq = match self.sequences.get(&(aggregate_type, aggregate_id.clone())) {
            Some(last) => last.next(),
            None => AggregateSeq::FIRST,
        };
        let event_id = EventId::new(self.last_event_id + 1);
        let (actor_type, actor_id) = actor.parts();

        let built = EventEnvelope::builder()
            .event_id(event_id)
            .aggregate(aggregate_type, aggregate_id.clone())
            .aggregate_seq(seq)
            .event_type(event.event_type())
            .actor(actor_type, actor_id)
            .caused_by(causation)
            .payload(event)
            .build();

        match built {
            Ok(envelope) => {
                self.last_event_id = event_id.value();
                self.sequences.insert((aggregate_type, aggregate_id), seq);
                self.pending.push(envelope);
                Some(event_id)
            }
            Err(e) => {
                error!(error = %e, "failed to build event envelope");
                None
            }
        }
    }

    /// Removes and returns every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<JournalEntry> {
        std::mem::take(&mut self.pending)
    }

    /// Pending events, oldest first.
    pub fn pending(&self) -> &[JournalEntry] {
        &self.pending
    }

    /// ID of the most recent event, if any was recorded.
    pub fn last_event_id(&self) -> Option<EventId> {
        (self.last_event_id > 0).then(|| EventId::new(self.last_event_id))
    }
}
