use common::UserId;
use thiserror::Error;

/// Errors that can occur while dispatching domain events.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A payload could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The acting user could not be resolved.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// A handler failed while processing an event.
    #[error("Handler error: {0}")]
    Handler(String),

    /// The state store failed.
    #[error("Store error: {0}")]
    Store(String),

    /// The outbox rejected a staged message.
    #[error("Outbox error: {0}")]
    Outbox(#[from] outbox::OutboxError),

    /// Follow-up events were still being produced after the final
    /// dispatch pass; handlers are feeding each other in a cycle.
    #[error("Follow-up events exceeded the dispatch pass limit")]
    FollowUpOverflow,
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
