//! Synchronous domain event dispatch and the consistency services on top.
//!
//! A mutation flows through two flushes: the first persists the entity and
//! drains its buffered events, then the [`EventDispatcher`] runs every
//! registered handler synchronously, and the second flush persists what
//! the handlers staged on the [`FlushContext`] (audit records and outbox
//! messages). Handlers never touch storage directly.

pub mod context;
pub mod current_user;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod integration;
pub mod recorders;
pub mod service;
pub mod store;

pub use context::FlushContext;
pub use current_user::{CurrentUser, InMemoryUserDirectory, StaticCurrentUser};
pub use dispatcher::EventDispatcher;
pub use error::{DispatchError, Result};
pub use handler::{EventHandler, HandlerRegistry};
pub use integration::{
    IssueOpenedNotification, IssueStatusChangedNotification, NotificationPublisher,
    RepositoryCreatedNotification,
};
pub use service::{IssueService, RepositoryService, ServiceError, ServiceResult};
pub use store::{InMemoryStateStore, StateStore};

use std::sync::Arc;

/// Builds the standard handler registry: all audit recorders plus the
/// notification publisher.
pub fn default_registry(current_user: Arc<dyn CurrentUser>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    recorders::register_recorders(&mut registry, current_user);
    integration::register_notifications(&mut registry);
    registry
}
