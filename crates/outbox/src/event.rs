use async_trait::async_trait;
use common::MessageId;
use serde::{Serialize, de::DeserializeOwned};

use crate::Result;

/// An event that crosses the process boundary through the outbox.
///
/// Unlike domain events, integration events carry their own message id so
/// the outbox insert can deduplicate redelivered publishes.
pub trait IntegrationEvent: Serialize + DeserializeOwned + Send + Sync {
    /// Stable name used to route messages to subscribers.
    fn event_type() -> &'static str;

    /// The identity of this particular occurrence.
    fn message_id(&self) -> MessageId;
}

/// A subscriber invoked with the payload of a delivered message.
#[async_trait]
pub trait IntegrationHandler: Send + Sync {
    async fn handle(&self, payload: serde_json::Value) -> Result<()>;
}
