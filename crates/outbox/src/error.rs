use thiserror::Error;

/// Errors that can occur when interacting with the outbox.
#[derive(Debug, Error)]
pub enum OutboxError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A subscriber failed to process a message.
    #[error("Handler error for {event_type}: {message}")]
    Handler {
        event_type: String,
        message: String,
    },
}

impl OutboxError {
    /// Builds a handler error for the given event type.
    pub fn handler(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            event_type: event_type.into(),
            message: message.into(),
        }
    }
}

/// Result type for outbox operations.
pub type Result<T> = std::result::Result<T, OutboxError>;
