use std::sync::Arc;

use common::MessageId;
use serde_json::Value;

use crate::{
    OutboxMessage, Result,
    event::{IntegrationEvent, IntegrationHandler},
    store::OutboxStore,
};

/// A registered subscriber for one event type.
struct Subscription {
    event_type: &'static str,
    decodes: fn(&Value) -> bool,
    handler: Arc<dyn IntegrationHandler>,
}

fn decode_probe<E: IntegrationEvent>(payload: &Value) -> bool {
    serde_json::from_value::<E>(payload.clone()).is_ok()
}

/// Publish side and delivery side of the outbox.
///
/// Publishing only writes to the store; the background processor calls
/// `get_batch`, `deliver` and `acknowledge` to drain it. Subscribers are
/// registered at startup and invoked in registration order.
pub struct EventBus {
    store: Arc<dyn OutboxStore>,
    subscriptions: Vec<Subscription>,
}

impl EventBus {
    /// Creates a bus over the given store with no subscribers.
    pub fn new(store: Arc<dyn OutboxStore>) -> Self {
        Self {
            store,
            subscriptions: Vec::new(),
        }
    }

    /// Gets a reference to the underlying store.
    pub fn store(&self) -> &Arc<dyn OutboxStore> {
        &self.store
    }

    /// Subscribes a handler to events of type `E`.
    ///
    /// The same handler instance may be subscribed under several types, and
    /// several handlers may share one type.
    pub fn subscribe<E: IntegrationEvent>(&mut self, handler: Arc<dyn IntegrationHandler>) {
        self.subscriptions.push(Subscription {
            event_type: E::event_type(),
            decodes: decode_probe::<E>,
            handler,
        });
    }

    /// Enqueues an integration event for delivery.
    pub async fn publish<E: IntegrationEvent>(&self, event: &E) -> Result<()> {
        let message = OutboxMessage::from_event(event)?;
        self.store.insert(&message).await?;
        metrics::counter!("outbox_published_total").increment(1);
        Ok(())
    }

    /// Enqueues an already-wrapped outbox message.
    pub async fn publish_message(&self, message: &OutboxMessage) -> Result<()> {
        self.store.insert(message).await?;
        metrics::counter!("outbox_published_total").increment(1);
        Ok(())
    }

    /// Fetches the next batch of deliverable messages, oldest first.
    ///
    /// Messages with no subscriber, or whose payload no longer decodes as
    /// the subscribed type, are skipped with a warning and stay in the
    /// store rather than being silently dropped.
    pub async fn get_batch(&self, size: usize) -> Result<Vec<OutboxMessage>> {
        let fetched = self.store.fetch_batch(size).await?;
        let mut batch = Vec::with_capacity(fetched.len());

        for message in fetched {
            let mut matching = self
                .subscriptions
                .iter()
                .filter(|s| s.event_type == message.event_type)
                .peekable();

            let Some(first) = matching.peek() else {
                tracing::warn!(
                    message_id = %message.id,
                    event_type = %message.event_type,
                    "no subscriber for outbox message, skipping"
                );
                continue;
            };

            if !(first.decodes)(&message.payload) {
                tracing::warn!(
                    message_id = %message.id,
                    event_type = %message.event_type,
                    "outbox payload does not decode, skipping"
                );
                metrics::counter!("outbox_poison_total").increment(1);
                continue;
            }

            batch.push(message);
        }

        Ok(batch)
    }

    /// Delivers one message to every matching subscriber, in registration
    /// order. The first handler error aborts delivery of this message.
    pub async fn deliver(&self, message: &OutboxMessage) -> Result<()> {
        for subscription in self
            .subscriptions
            .iter()
            .filter(|s| s.event_type == message.event_type)
        {
            subscription.handler.handle(message.payload.clone()).await?;
        }

        metrics::counter!("outbox_delivered_total").increment(1);
        Ok(())
    }

    /// Marks a message as delivered by removing it from the store.
    pub async fn acknowledge(&self, id: MessageId) -> Result<()> {
        self.store.delete(id).await?;
        metrics::counter!("outbox_acknowledged_total").increment(1);
        Ok(())
    }
}
