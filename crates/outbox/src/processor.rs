use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};

use crate::bus::EventBus;

/// Configuration for the background outbox processor.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum number of messages drained per poll.
    pub batch_size: usize,

    /// How long to wait between polls.
    pub poll_interval: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ProcessorConfig {
    /// Loads the configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let batch_size = std::env::var("OUTBOX_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.batch_size);

        let poll_interval = std::env::var("OUTBOX_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        Self {
            batch_size,
            poll_interval,
        }
    }
}

/// Background worker that drains the outbox and delivers messages.
///
/// Delivery is at-least-once: a message is acknowledged only after every
/// subscriber has handled it, so a crash between delivery and
/// acknowledgment redelivers on the next poll. A delivery failure stops
/// the current batch; acknowledgments already made stand, and the failed
/// message plus everything behind it is retried later in order.
pub struct OutboxProcessor {
    bus: Arc<EventBus>,
    config: ProcessorConfig,
}

impl OutboxProcessor {
    /// Creates a processor over the given bus.
    pub fn new(bus: Arc<EventBus>, config: ProcessorConfig) -> Self {
        Self { bus, config }
    }

    /// Runs the processing loop until shutdown is signaled.
    ///
    /// The loop does not start polling until `started` fires, so callers
    /// can finish wiring subscribers first. A shutdown signaled before the
    /// start signal wins and the processor exits without polling.
    #[tracing::instrument(skip_all)]
    pub async fn run(self, started: oneshot::Receiver<()>, mut shutdown: watch::Receiver<bool>) {
        if *shutdown.borrow() {
            return;
        }

        tokio::select! {
            biased;

            _ = shutdown.changed() => {
                tracing::info!("shutdown before start signal, exiting");
                return;
            }
            result = started => {
                if result.is_err() {
                    tracing::warn!("start signal dropped, exiting");
                    return;
                }
            }
        }

        tracing::info!(
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "outbox processor started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let batch = match self.bus.get_batch(self.config.batch_size).await {
                Ok(batch) => batch,
                Err(error) => {
                    tracing::warn!(error = %error, "failed to fetch outbox batch");
                    metrics::counter!("outbox_fetch_failures_total").increment(1);
                    Vec::new()
                }
            };

            for message in batch {
                if let Err(error) = self.bus.deliver(&message).await {
                    tracing::warn!(
                        message_id = %message.id,
                        event_type = %message.event_type,
                        error = %error,
                        "delivery failed, message stays queued"
                    );
                    metrics::counter!("outbox_delivery_failures_total").increment(1);
                    break;
                }

                if let Err(error) = self.bus.acknowledge(message.id).await {
                    tracing::warn!(
                        message_id = %message.id,
                        error = %error,
                        "acknowledge failed, message will be redelivered"
                    );
                    break;
                }
            }

            // One interval between polls regardless of how the batch went,
            // so a persistently failing message retries at the poll cadence
            // instead of spinning.
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = shutdown.changed() => {}
            }
        }

        tracing::info!("outbox processor stopped");
    }
}
