//! Transactional outbox with at-least-once background delivery.
//!
//! Integration events are serialized into [`OutboxMessage`]s and written to
//! an [`OutboxStore`] in the same unit of work as the state change that
//! produced them. A background [`OutboxProcessor`] then drains the store
//! through the [`EventBus`] and hands each message to its subscribers,
//! acknowledging only after delivery succeeds.

pub mod bus;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod postgres;
pub mod processor;
pub mod store;

pub use bus::EventBus;
pub use error::{OutboxError, Result};
pub use event::{IntegrationEvent, IntegrationHandler};
pub use memory::InMemoryOutboxStore;
pub use message::OutboxMessage;
pub use postgres::PostgresOutboxStore;
pub use processor::{OutboxProcessor, ProcessorConfig};
pub use store::OutboxStore;
