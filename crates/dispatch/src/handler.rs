use std::sync::Arc;

use async_trait::async_trait;
use domain::EventRecord;

use crate::{FlushContext, Result};

/// A synchronous subscriber for domain events of one exact type.
///
/// Handlers run inside the producing request, between the first and second
/// flush. They must not write to storage; side effects go through the
/// [`FlushContext`].
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, record: &EventRecord, ctx: &FlushContext) -> Result<()>;
}

/// Exact-type handler registry.
///
/// A handler fires only for the event type it was registered under; there
/// is no wildcard or prefix matching. One handler instance may be
/// registered under several types, and several handlers may share a type,
/// firing in registration order.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<(String, Arc<dyn EventHandler>)>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one event type.
    pub fn register(&mut self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.handlers.push((event_type.into(), handler));
    }

    /// Returns the handlers for an event type, in registration order.
    pub fn handlers_for<'a>(
        &'a self,
        event_type: &'a str,
    ) -> impl Iterator<Item = &'a Arc<dyn EventHandler>> {
        self.handlers
            .iter()
            .filter(move |(registered, _)| registered == event_type)
            .map(|(_, handler)| handler)
    }

    /// Returns the number of registrations.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl EventHandler for Noop {
        async fn handle(&self, _record: &EventRecord, _ctx: &FlushContext) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn matching_is_exact() {
        let mut registry = HandlerRegistry::new();
        registry.register("IssueLocked", Arc::new(Noop));

        assert_eq!(registry.handlers_for("IssueLocked").count(), 1);
        assert_eq!(registry.handlers_for("IssueLock").count(), 0);
        assert_eq!(registry.handlers_for("IssueLockedExtra").count(), 0);
    }

    #[test]
    fn one_instance_under_several_types() {
        let mut registry = HandlerRegistry::new();
        let handler: Arc<dyn EventHandler> = Arc::new(Noop);
        registry.register("IssueLocked", handler.clone());
        registry.register("IssueUnlocked", handler);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.handlers_for("IssueUnlocked").count(), 1);
    }
}
