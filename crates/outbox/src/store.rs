use async_trait::async_trait;
use common::MessageId;

use crate::{OutboxMessage, Result};

/// Durable storage for outbox messages.
///
/// Implementations must make `insert` idempotent by message id and return
/// batches oldest-first, so the processor preserves publish order.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Stores a message. Inserting an already-stored id is a no-op.
    async fn insert(&self, message: &OutboxMessage) -> Result<()>;

    /// Returns up to `limit` undelivered messages, oldest first.
    async fn fetch_batch(&self, limit: usize) -> Result<Vec<OutboxMessage>>;

    /// Removes a delivered message. Deleting a missing id is a no-op.
    async fn delete(&self, id: MessageId) -> Result<()>;

    /// Returns the number of undelivered messages.
    async fn pending_count(&self) -> Result<usize>;
}
