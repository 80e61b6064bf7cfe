//! Per-entity buffer of pending domain events.

use crate::event::DomainEvent;

/// An ordered set of pending domain events, owned by the producing entity.
///
/// The buffer preserves insertion order but suppresses structurally equal
/// duplicates, so recording the same fact twice within one write yields a
/// single pending event. Buffering never triggers dispatch; draining is the
/// dispatcher's job.
#[derive(Debug, Clone)]
pub struct EventBuffer<E: DomainEvent> {
    pending: Vec<E>,
}

impl<E: DomainEvent> EventBuffer<E> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Records an event unless a structurally equal one is already pending.
    ///
    /// Returns true if the event was appended.
    pub fn record(&mut self, event: E) -> bool {
        if self.pending.contains(&event) {
            return false;
        }
        self.pending.push(event);
        true
    }

    /// Returns the pending events in insertion order and empties the buffer.
    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.pending)
    }

    /// Returns the pending events without draining them.
    pub fn pending(&self) -> &[E] {
        &self.pending
    }

    /// Returns true if no events are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl<E: DomainEvent> Default for EventBuffer<E> {
    fn default() -> Self {
        Self::new()
    }
}
