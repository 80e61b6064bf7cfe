use domain::EventRecord;

use crate::{DispatchError, FlushContext, HandlerRegistry, Result};

/// Maximum number of dispatch passes per flush. The first pass carries the
/// entity's own events, the second carries handler follow-ups; follow-ups
/// produced on the second pass are a cycle and abort the flush.
const MAX_PASSES: usize = 2;

/// Routes drained event records to their registered handlers.
///
/// Dispatch is synchronous and fail-fast: handlers for one record run in
/// registration order, records run in drain order, and the first handler
/// error aborts the whole dispatch with nothing staged surviving.
pub struct EventDispatcher {
    registry: HandlerRegistry,
}

impl EventDispatcher {
    /// Creates a dispatcher over the given registry.
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Gets a reference to the registry.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dispatches a batch of records, then any follow-ups they staged.
    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub async fn dispatch(&self, records: Vec<EventRecord>, ctx: &FlushContext) -> Result<()> {
        let mut queue = records;
        let mut pass = 0;

        while !queue.is_empty() {
            if pass == MAX_PASSES {
                tracing::error!("handlers kept producing follow-up events, aborting dispatch");
                return Err(DispatchError::FollowUpOverflow);
            }
            pass += 1;

            for record in &queue {
                for handler in self.registry.handlers_for(&record.event_type) {
                    handler.handle(record, ctx).await?;
                    metrics::counter!("events_dispatched_total").increment(1);
                }
            }

            queue = ctx.take_follow_ups().await;
        }

        Ok(())
    }
}
