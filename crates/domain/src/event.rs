//! Core domain event traits and the dispatch carrier type.

use chrono::{DateTime, Utc};
use common::EntityId;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events are immutable facts describing a completed state change,
/// named in past tense. Equality is structural so that an entity's buffer
/// can suppress duplicates of the same fact within one write.
pub trait DomainEvent: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync {
    /// Returns the event type name.
    ///
    /// Used to route the event to the handlers subscribed to exactly
    /// this type.
    fn event_type(&self) -> &'static str;
}

/// A domain event as carried across the dispatch boundary.
///
/// The record pairs the producing entity's id with the event's declared
/// type name and serialized payload. It has no transport semantics of its
/// own; handlers decode the payload back into the typed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// The entity that produced the event.
    pub entity_id: EntityId,

    /// The event's declared type name.
    pub event_type: String,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// When the event was drained from its buffer.
    pub recorded_at: DateTime<Utc>,
}

impl EventRecord {
    /// Builds a record from a typed domain event.
    pub fn from_event<E: DomainEvent>(
        entity_id: EntityId,
        event: &E,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            entity_id,
            event_type: event.event_type().to_string(),
            payload: serde_json::to_value(event)?,
            recorded_at: Utc::now(),
        })
    }

    /// Decodes the payload back into a typed domain event.
    pub fn decode<E: DomainEvent>(&self) -> Result<E, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Trait for identity-bearing entities that buffer their own domain events.
///
/// The buffer is populated only by the entity's own mutators; dispatch
/// drains it after a successful write.
pub trait DomainEntity {
    /// Returns the entity's unique identifier.
    fn entity_id(&self) -> EntityId;

    /// Returns true if the entity has undispatched events.
    fn has_pending_events(&self) -> bool;

    /// Drains the buffer into dispatch records, emptying it.
    fn drain_event_records(&mut self) -> Result<Vec<EventRecord>, serde_json::Error>;
}
