//! Outbox delivery worker entry point.

mod config;

use std::sync::Arc;

use async_trait::async_trait;
use dispatch::{
    IssueOpenedNotification, IssueStatusChangedNotification, RepositoryCreatedNotification,
};
use outbox::{
    EventBus, IntegrationHandler, OutboxError, OutboxProcessor, PostgresOutboxStore,
};
use tokio::signal;
use tokio::sync::{oneshot, watch};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::WorkerConfig;

/// Logs every delivered notification. Stands in for downstream consumers
/// (webhooks, search indexing) that hang off the same bus in production.
struct LoggingHandler {
    event_type: &'static str,
}

#[async_trait]
impl IntegrationHandler for LoggingHandler {
    async fn handle(&self, payload: serde_json::Value) -> Result<(), OutboxError> {
        tracing::info!(event_type = self.event_type, %payload, "notification delivered");
        Ok(())
    }
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let _metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Connect to the outbox database and migrate
    let config = WorkerConfig::from_env();
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let store = PostgresOutboxStore::new(pool);
    store.run_migrations().await.expect("migrations failed");

    // 4. Wire subscribers before the processor starts polling
    let mut bus = EventBus::new(Arc::new(store));
    bus.subscribe::<RepositoryCreatedNotification>(Arc::new(LoggingHandler {
        event_type: "RepositoryCreatedNotification",
    }));
    bus.subscribe::<IssueOpenedNotification>(Arc::new(LoggingHandler {
        event_type: "IssueOpenedNotification",
    }));
    bus.subscribe::<IssueStatusChangedNotification>(Arc::new(LoggingHandler {
        event_type: "IssueStatusChangedNotification",
    }));

    // 5. Start the processor and release it once wiring is done
    let (started_tx, started_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let processor = OutboxProcessor::new(Arc::new(bus), config.processor.clone());
    let task = tokio::spawn(processor.run(started_rx, shutdown_rx));

    started_tx.send(()).expect("processor exited during startup");
    tracing::info!(
        batch_size = config.processor.batch_size,
        "delivery worker running"
    );

    // 6. Run until a signal arrives, then drain and stop
    shutdown_signal().await;
    shutdown_tx.send(true).expect("processor already gone");
    task.await.expect("processor task panicked");

    tracing::info!("worker shut down gracefully");
}
