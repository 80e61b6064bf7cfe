use chrono::{DateTime, Utc};
use common::MessageId;
use serde::{Deserialize, Serialize};

use crate::{Result, event::IntegrationEvent};

/// A serialized integration event waiting in the outbox.
///
/// The message id is the event's own id, so publishing the same event twice
/// lands on the same row and the insert stays idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    /// Message identifier, taken from the integration event.
    pub id: MessageId,

    /// Routing key used to find subscribers.
    pub event_type: String,

    /// Serialized event payload.
    pub payload: serde_json::Value,

    /// Delivery attempt counter. Tracked for operability; delivery itself
    /// retries by leaving the row in place until it is acknowledged.
    pub retries: i32,

    /// When the message was enqueued.
    pub created_at: DateTime<Utc>,
}

impl OutboxMessage {
    /// Wraps an integration event into an outbox message.
    pub fn from_event<E: IntegrationEvent>(event: &E) -> Result<Self> {
        Ok(Self {
            id: event.message_id(),
            event_type: E::event_type().to_string(),
            payload: serde_json::to_value(event)?,
            retries: 0,
            created_at: Utc::now(),
        })
    }
}
