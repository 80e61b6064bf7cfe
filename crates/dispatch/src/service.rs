use std::sync::Arc;

use common::{EntityId, UserId};
use domain::{ChangeLog, DomainEntity, Issue, IssueError, Label, Repository, RepositoryError};
use outbox::EventBus;
use thiserror::Error;

use crate::{CurrentUser, DispatchError, EventDispatcher, FlushContext, StateStore};

/// Errors surfaced by the application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// An issue guard rejected the mutation.
    #[error("Issue error: {0}")]
    Issue(#[from] IssueError),

    /// A repository guard rejected the mutation.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Dispatch or persistence failed after the mutation.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The entity does not exist.
    #[error("Entity not found: {0}")]
    NotFound(EntityId),
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Second flush: persist everything the handlers staged.
///
/// Change logs and outbox messages land in the same stores the first
/// flush used; a failure here surfaces to the caller with the staged
/// context dropped.
async fn commit_staged(
    store: &Arc<dyn StateStore>,
    bus: &Arc<EventBus>,
    ctx: &FlushContext,
) -> Result<(), DispatchError> {
    if !ctx.has_staged().await {
        return Ok(());
    }

    let logs = ctx.take_change_logs().await;
    if !logs.is_empty() {
        store.append_change_logs(&logs).await?;
    }

    for message in ctx.take_messages().await {
        bus.publish_message(&message).await?;
    }

    Ok(())
}

/// Application service for repository workflows.
pub struct RepositoryService {
    store: Arc<dyn StateStore>,
    dispatcher: Arc<EventDispatcher>,
    bus: Arc<EventBus>,
    current_user: Arc<dyn CurrentUser>,
}

impl RepositoryService {
    pub fn new(
        store: Arc<dyn StateStore>,
        dispatcher: Arc<EventDispatcher>,
        bus: Arc<EventBus>,
        current_user: Arc<dyn CurrentUser>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            bus,
            current_user,
        }
    }

    /// First flush, dispatch, second flush.
    async fn flush(&self, repository: &mut Repository) -> Result<(), DispatchError> {
        let start = std::time::Instant::now();
        self.store.save_repository(repository).await?;

        let records = repository.drain_event_records()?;
        if !records.is_empty() {
            let ctx = FlushContext::new();
            self.dispatcher.dispatch(records, &ctx).await?;
            commit_staged(&self.store, &self.bus, &ctx).await?;
        }

        metrics::histogram!("flush_duration_seconds").record(start.elapsed().as_secs_f64());
        Ok(())
    }

    async fn load(&self, repository_id: EntityId) -> ServiceResult<Repository> {
        self.store
            .load_repository(repository_id)
            .await?
            .ok_or(ServiceError::NotFound(repository_id))
    }

    /// Creates a repository owned by the current user.
    #[tracing::instrument(skip(self))]
    pub async fn create_repository(&self, name: &str) -> ServiceResult<EntityId> {
        let owner = self.current_user.current_user().await?;
        let mut repository = Repository::create(name, owner.id);
        let repository_id = repository.id();

        self.flush(&mut repository).await?;
        tracing::info!(%repository_id, "repository created");
        Ok(repository_id)
    }

    /// Adds a status to a repository's workflow.
    #[tracing::instrument(skip(self))]
    pub async fn add_status(
        &self,
        repository_id: EntityId,
        name: &str,
        color: &str,
    ) -> ServiceResult<EntityId> {
        let mut repository = self.load(repository_id).await?;
        let status_id = repository.add_status(name, color)?;
        self.flush(&mut repository).await?;
        Ok(status_id)
    }

    /// Allows moving issues from `from` to `to`.
    #[tracing::instrument(skip(self))]
    pub async fn add_transition(
        &self,
        repository_id: EntityId,
        from: EntityId,
        to: EntityId,
    ) -> ServiceResult<()> {
        let mut repository = self.load(repository_id).await?;
        repository.add_transition(from, to)?;
        self.flush(&mut repository).await?;
        Ok(())
    }

    /// Forbids moving issues from `from` to `to`.
    #[tracing::instrument(skip(self))]
    pub async fn remove_transition(
        &self,
        repository_id: EntityId,
        from: EntityId,
        to: EntityId,
    ) -> ServiceResult<()> {
        let mut repository = self.load(repository_id).await?;
        repository.remove_transition(from, to);
        self.flush(&mut repository).await?;
        Ok(())
    }

    /// Returns a repository by id.
    pub async fn get_repository(&self, repository_id: EntityId) -> ServiceResult<Repository> {
        self.load(repository_id).await
    }
}

/// Application service for issue workflows.
///
/// Every mutator follows the same shape: load, run the entity's guarded
/// mutator, then flush. A guard rejection returns before anything is
/// written; a dispatch failure leaves the entity state saved but commits
/// none of the staged artifacts.
pub struct IssueService {
    store: Arc<dyn StateStore>,
    dispatcher: Arc<EventDispatcher>,
    bus: Arc<EventBus>,
    current_user: Arc<dyn CurrentUser>,
}

impl IssueService {
    pub fn new(
        store: Arc<dyn StateStore>,
        dispatcher: Arc<EventDispatcher>,
        bus: Arc<EventBus>,
        current_user: Arc<dyn CurrentUser>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            bus,
            current_user,
        }
    }

    async fn flush(&self, issue: &mut Issue) -> Result<(), DispatchError> {
        let start = std::time::Instant::now();
        self.store.save_issue(issue).await?;

        let records = issue.drain_event_records()?;
        if !records.is_empty() {
            let ctx = FlushContext::new();
            self.dispatcher.dispatch(records, &ctx).await?;
            commit_staged(&self.store, &self.bus, &ctx).await?;
        }

        metrics::histogram!("flush_duration_seconds").record(start.elapsed().as_secs_f64());
        Ok(())
    }

    async fn load(&self, issue_id: EntityId) -> ServiceResult<Issue> {
        self.store
            .load_issue(issue_id)
            .await?
            .ok_or(ServiceError::NotFound(issue_id))
    }

    async fn load_repository(&self, repository_id: EntityId) -> ServiceResult<Repository> {
        self.store
            .load_repository(repository_id)
            .await?
            .ok_or(ServiceError::NotFound(repository_id))
    }

    /// Opens an issue authored by the current user.
    #[tracing::instrument(skip(self, title))]
    pub async fn open_issue(
        &self,
        repository_id: EntityId,
        status_id: EntityId,
        title: &str,
    ) -> ServiceResult<EntityId> {
        let repository = self.load_repository(repository_id).await?;
        let author = self.current_user.current_user().await?;

        let mut issue = Issue::open(&repository, status_id, title, author.id)?;
        let issue_id = issue.id();

        self.flush(&mut issue).await?;
        tracing::info!(%issue_id, %repository_id, "issue opened");
        Ok(issue_id)
    }

    /// Moves an issue to another status of its repository.
    #[tracing::instrument(skip(self))]
    pub async fn transition_issue(
        &self,
        issue_id: EntityId,
        status_id: EntityId,
    ) -> ServiceResult<()> {
        let mut issue = self.load(issue_id).await?;
        let repository = self.load_repository(issue.repository_id()).await?;

        issue.transition_to(status_id, &repository)?;
        self.flush(&mut issue).await?;
        Ok(())
    }

    /// Locks an issue.
    #[tracing::instrument(skip(self))]
    pub async fn lock_issue(&self, issue_id: EntityId, reason: Option<String>) -> ServiceResult<()> {
        let mut issue = self.load(issue_id).await?;
        issue.lock(reason)?;
        self.flush(&mut issue).await?;
        Ok(())
    }

    /// Unlocks an issue.
    #[tracing::instrument(skip(self))]
    pub async fn unlock_issue(&self, issue_id: EntityId) -> ServiceResult<()> {
        let mut issue = self.load(issue_id).await?;
        issue.unlock();
        self.flush(&mut issue).await?;
        Ok(())
    }

    /// Adds a label to an issue.
    #[tracing::instrument(skip(self, label))]
    pub async fn add_label(&self, issue_id: EntityId, label: Label) -> ServiceResult<()> {
        let mut issue = self.load(issue_id).await?;
        issue.add_label(label)?;
        self.flush(&mut issue).await?;
        Ok(())
    }

    /// Removes a label from an issue.
    #[tracing::instrument(skip(self))]
    pub async fn remove_label(&self, issue_id: EntityId, name: &str) -> ServiceResult<()> {
        let mut issue = self.load(issue_id).await?;
        issue.remove_label(name)?;
        self.flush(&mut issue).await?;
        Ok(())
    }

    /// Changes an issue's assignee.
    #[tracing::instrument(skip(self))]
    pub async fn assign_issue(
        &self,
        issue_id: EntityId,
        assignee: Option<UserId>,
    ) -> ServiceResult<()> {
        let mut issue = self.load(issue_id).await?;
        issue.assign(assignee)?;
        self.flush(&mut issue).await?;
        Ok(())
    }

    /// Renames an issue.
    #[tracing::instrument(skip(self, title))]
    pub async fn rename_issue(&self, issue_id: EntityId, title: &str) -> ServiceResult<()> {
        let mut issue = self.load(issue_id).await?;
        issue.rename(title)?;
        self.flush(&mut issue).await?;
        Ok(())
    }

    /// Adds a comment authored by the current user.
    #[tracing::instrument(skip(self, body))]
    pub async fn comment_on_issue(&self, issue_id: EntityId, body: &str) -> ServiceResult<EntityId> {
        let mut issue = self.load(issue_id).await?;
        let author = self.current_user.current_user().await?;

        let comment_id = issue.add_comment(author.id, body)?;
        self.flush(&mut issue).await?;
        Ok(comment_id)
    }

    /// Returns an issue by id.
    pub async fn get_issue(&self, issue_id: EntityId) -> ServiceResult<Issue> {
        self.load(issue_id).await
    }

    /// Returns an issue's audit trail, oldest first.
    pub async fn change_log(&self, issue_id: EntityId) -> ServiceResult<Vec<ChangeLog>> {
        Ok(self.store.change_logs_for(issue_id).await?)
    }
}
