use std::sync::Arc;

use async_trait::async_trait;
use common::MessageId;
use tokio::sync::RwLock;

use crate::{OutboxMessage, Result, store::OutboxStore};

/// In-memory outbox store implementation for testing.
///
/// Messages are kept in insertion order; fetches sort by `created_at` so
/// backdated messages drain in the same order the Postgres store returns
/// them.
#[derive(Clone, Default)]
pub struct InMemoryOutboxStore {
    messages: Arc<RwLock<Vec<OutboxMessage>>>,
}

impl InMemoryOutboxStore {
    /// Creates a new empty in-memory outbox store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all messages.
    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn insert(&self, message: &OutboxMessage) -> Result<()> {
        let mut messages = self.messages.write().await;
        if messages.iter().any(|m| m.id == message.id) {
            return Ok(());
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn fetch_batch(&self, limit: usize) -> Result<Vec<OutboxMessage>> {
        let mut pending: Vec<OutboxMessage> = self.messages.read().await.iter().cloned().collect();
        // Stable sort: ties on created_at keep insertion order.
        pending.sort_by_key(|m| m.created_at);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn delete(&self, id: MessageId) -> Result<()> {
        self.messages.write().await.retain(|m| m.id != id);
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize> {
        Ok(self.messages.read().await.len())
    }
}
