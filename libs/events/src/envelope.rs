//! Journal envelope: the metadata every circulation event is wrapped in
//! before it leaves the engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelfmark_id::{AggregateSeq, EventId};

use crate::EventError;

/// Who caused an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    /// A patron, through the CRUD layer.
    Requester,
    /// Hand-offs and reorganizations the engine performs on its own.
    #[default]
    System,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::Requester => "requester",
            ActorType::System => "system",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an event is about: one book, or the bookcase as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregateType {
    #[default]
    Book,
    Bookcase,
}

impl AggregateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateType::Book => "book",
            AggregateType::Bookcase => "bookcase",
        }
    }
}

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event plus its journal metadata.
///
/// `event_id` orders the whole journal; `aggregate_seq` orders the events of
/// one book (or of the bookcase). `causation_id` points at the event that
/// triggered this one, e.g. a hand-off at the `loan.ended` that freed the
/// book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<P> {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub aggregate_type: AggregateType,
    /// Book key, or `bookcase`.
    pub aggregate_id: String,
    pub aggregate_seq: AggregateSeq,
    /// One of [`crate::event_types`].
    pub event_type: String,
    pub event_version: i32,
    pub actor_type: ActorType,
    pub actor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<EventId>,
    pub payload: P,
}

impl<P> EventEnvelope<P> {
    pub fn builder() -> EventEnvelopeBuilder<P> {
        EventEnvelopeBuilder::default()
    }

    /// True when this event was triggered by another one.
    pub fn is_caused(&self) -> bool {
        self.causation_id.is_some()
    }
}

impl<P: Serialize> EventEnvelope<P> {
    /// JSON form handed to the persistence layer.
    pub fn to_json(&self) -> Result<serde_json::Value, EventError> {
        Ok(serde_json::to_value(self)?)
    }
}

// =============================================================================
// Builder
// =============================================================================

const CURRENT_EVENT_VERSION: i32 = 1;

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, EventError> {
    value.ok_or(EventError::MissingField(field))
}

/// Assembles an [`EventEnvelope`]. Everything except `occurred_at` (defaults
/// to now), `event_version` and `causation_id` is mandatory.
#[derive(Debug)]
pub struct EventEnvelopeBuilder<P> {
    event_id: Option<EventId>,
    occurred_at: Option<DateTime<Utc>>,
    aggregate: Option<(AggregateType, String)>,
    aggregate_seq: Option<AggregateSeq>,
    event_type: Option<String>,
    event_version: i32,
    actor: Option<(ActorType, String)>,
    causation_id: Option<EventId>,
    payload: Option<P>,
}

impl<P> Default for EventEnvelopeBuilder<P> {
    fn default() -> Self {
        Self {
            event_id: None,
            occurred_at: None,
            aggregate: None,
            aggregate_seq: None,
            event_type: None,
            event_version: CURRENT_EVENT_VERSION,
            actor: None,
            causation_id: None,
            payload: None,
        }
    }
}

impl<P> EventEnvelopeBuilder<P> {
    pub fn event_id(self, event_id: EventId) -> Self {
        Self {
            event_id: Some(event_id),
            ..self
        }
    }

    pub fn occurred_at(self, at: DateTime<Utc>) -> Self {
        Self {
            occurred_at: Some(at),
            ..self
        }
    }

    pub fn aggregate(self, kind: AggregateType, id: impl Into<String>) -> Self {
        Self {
            aggregate: Some((kind, id.into())),
            ..self
        }
    }

    pub fn aggregate_seq(self, seq: AggregateSeq) -> Self {
        Self {
            aggregate_seq: Some(seq),
            ..self
        }
    }

    pub fn event_type(self, name: impl Into<String>) -> Self {
        Self {
            event_type: Some(name.into()),
            ..self
        }
    }

    pub fn event_version(self, version: i32) -> Self {
        Self {
            event_version: version,
            ..self
        }
    }

    pub fn actor(self, kind: ActorType, id: impl Into<String>) -> Self {
        Self {
            actor: Some((kind, id.into())),
            ..self
        }
    }

    /// Links the event to the one that triggered it, if any.
    pub fn caused_by(self, cause: Option<EventId>) -> Self {
        Self {
            causation_id: cause,
            ..self
        }
    }

    pub fn payload(self, payload: P) -> Self {
        Self {
            payload: Some(payload),
            ..self
        }
    }

    pub fn build(self) -> Result<EventEnvelope<P>, EventError> {
        let (aggregate_type, aggregate_id) = require(self.aggregate, "aggregate")?;
        let (actor_type, actor_id) = require(self.actor, "actor")?;
        Ok(EventEnvelope {
            event_id: require(self.event_id, "event_id")?,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            aggregate_type,
            aggregate_id,
            aggregate_seq: require(self.aggregate_seq, "aggregate_seq")?,
            event_type: require(self.event_type, "event_type")?,
            event_version: self.event_version,
            actor_type,
            actor_id,
            causation_id: self.causation_id,
            payload: require(self.payload, "payload")?,
        })
    }
}
