use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::EntityId;
use domain::{ChangeLog, Issue, Repository};
use tokio::sync::RwLock;

use crate::Result;

/// Persistence seam for entity state and audit records.
///
/// Saving persists the serialized entity state only; event buffers are
/// deliberately excluded from serialization, so a loaded entity never
/// re-dispatches facts already handled. Change logs are append-only.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Saves a repository's current state, replacing any previous state.
    async fn save_repository(&self, repository: &Repository) -> Result<()>;

    /// Loads a repository by id.
    async fn load_repository(&self, id: EntityId) -> Result<Option<Repository>>;

    /// Saves an issue's current state, replacing any previous state.
    async fn save_issue(&self, issue: &Issue) -> Result<()>;

    /// Loads an issue by id.
    async fn load_issue(&self, id: EntityId) -> Result<Option<Issue>>;

    /// Appends audit records. Existing records are never touched.
    async fn append_change_logs(&self, logs: &[ChangeLog]) -> Result<()>;

    /// Returns the audit records for one issue, in append order.
    async fn change_logs_for(&self, issue_id: EntityId) -> Result<Vec<ChangeLog>>;
}

/// In-memory state store implementation for testing.
///
/// Entities are kept as serialized JSON so that loading goes through the
/// same serialization boundary as a database-backed store would.
#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    repositories: Arc<RwLock<HashMap<EntityId, serde_json::Value>>>,
    issues: Arc<RwLock<HashMap<EntityId, serde_json::Value>>>,
    change_logs: Arc<RwLock<Vec<ChangeLog>>>,
}

impl InMemoryStateStore {
    /// Creates a new empty state store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of audit records.
    pub async fn change_log_count(&self) -> usize {
        self.change_logs.read().await.len()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn save_repository(&self, repository: &Repository) -> Result<()> {
        let state = serde_json::to_value(repository)?;
        self.repositories.write().await.insert(repository.id(), state);
        Ok(())
    }

    async fn load_repository(&self, id: EntityId) -> Result<Option<Repository>> {
        let repositories = self.repositories.read().await;
        repositories
            .get(&id)
            .map(|state| serde_json::from_value(state.clone()))
            .transpose()
            .map_err(Into::into)
    }

    async fn save_issue(&self, issue: &Issue) -> Result<()> {
        let state = serde_json::to_value(issue)?;
        self.issues.write().await.insert(issue.id(), state);
        Ok(())
    }

    async fn load_issue(&self, id: EntityId) -> Result<Option<Issue>> {
        let issues = self.issues.read().await;
        issues
            .get(&id)
            .map(|state| serde_json::from_value(state.clone()))
            .transpose()
            .map_err(Into::into)
    }

    async fn append_change_logs(&self, logs: &[ChangeLog]) -> Result<()> {
        self.change_logs.write().await.extend_from_slice(logs);
        Ok(())
    }

    async fn change_logs_for(&self, issue_id: EntityId) -> Result<Vec<ChangeLog>> {
        let logs = self.change_logs.read().await;
        Ok(logs
            .iter()
            .filter(|log| log.issue_id() == issue_id)
            .cloned()
            .collect())
    }
}
