//! Issue entity with guarded, event-buffering mutators.

use common::{EntityId, UserId};
use serde::{Deserialize, Serialize};

use crate::buffer::EventBuffer;
use crate::event::{DomainEntity, EventRecord};
use crate::repository::Repository;
use crate::status::IssueStatus;

use super::{
    Comment, IssueError, IssueEvent, Label,
    events::{
        AssigneeChangedData, CommentAddedData, IssueOpenedData, LabelAddedData, LabelRemovedData,
        LockedData, StatusChangedData, TitleChangedData,
    },
};

/// An issue in a repository.
///
/// Every observable mutation goes through a guarded mutator that validates
/// first and, on success, updates state and buffers the corresponding
/// domain event. The mutators never write audit records themselves; the
/// change-log recorders react to the buffered events after the flush.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Unique issue identifier.
    id: EntityId,

    /// The repository this issue belongs to.
    repository_id: EntityId,

    /// Issue title.
    title: String,

    /// Current status. An issue always has exactly one.
    status: IssueStatus,

    /// Assigned user, if any.
    assignee: Option<UserId>,

    /// Whether the issue is locked against mutation.
    locked: bool,

    /// Labels, unique by name.
    labels: Vec<Label>,

    /// Comment thread.
    comments: Vec<Comment>,

    /// Pending domain events. In-memory only, never persisted.
    #[serde(skip)]
    events: EventBuffer<IssueEvent>,
}

// Query methods
impl Issue {
    /// Returns the issue identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the id of the owning repository.
    pub fn repository_id(&self) -> EntityId {
        self.repository_id
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the current status.
    pub fn status(&self) -> &IssueStatus {
        &self.status
    }

    /// Returns the assignee, if any.
    pub fn assignee(&self) -> Option<UserId> {
        self.assignee
    }

    /// Returns true if the issue is locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns the labels in addition order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Returns true if a label with this name is present.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    /// Returns the comments in addition order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }
}

// Command methods (validate, mutate, buffer an event)
impl Issue {
    /// Opens a new issue in the given repository.
    ///
    /// The initial status must resolve within the repository.
    pub fn open(
        repository: &Repository,
        status_id: EntityId,
        title: impl Into<String>,
        author: UserId,
    ) -> Result<Self, IssueError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(IssueError::EmptyTitle);
        }

        let status = repository
            .status(status_id)
            .ok_or(IssueError::StatusNotFound(status_id))?
            .clone();

        let id = EntityId::new();
        let mut issue = Self {
            id,
            repository_id: repository.id(),
            title: title.clone(),
            status,
            assignee: None,
            locked: false,
            labels: Vec::new(),
            comments: Vec::new(),
            events: EventBuffer::new(),
        };

        issue.events.record(IssueEvent::Opened(IssueOpenedData {
            issue_id: id,
            repository_id: repository.id(),
            title,
            status_id,
            author,
        }));

        Ok(issue)
    }

    /// Moves the issue to another status of its repository.
    ///
    /// A request for the current status is a no-op. The transition must be
    /// legal on the repository's graph, and the repository must be the
    /// issue's own.
    pub fn transition_to(
        &mut self,
        status_id: EntityId,
        repository: &Repository,
    ) -> Result<(), IssueError> {
        if status_id == self.status.id() {
            return Ok(());
        }

        self.ensure_unlocked()?;

        if repository.id() != self.repository_id {
            return Err(IssueError::RepositoryMismatch {
                issue_repository: self.repository_id,
                repository: repository.id(),
            });
        }

        let target = repository
            .status(status_id)
            .ok_or(IssueError::StatusNotFound(status_id))?;

        if !repository.can_transition(self.status.id(), status_id) {
            return Err(IssueError::InvalidTransition {
                from: self.status.name().to_string(),
                to: target.name().to_string(),
            });
        }

        let old = std::mem::replace(&mut self.status, target.clone());

        self.events
            .record(IssueEvent::StatusChanged(StatusChangedData {
                old_status_id: old.id(),
                old_status: old.name().to_string(),
                new_status_id: self.status.id(),
                new_status: self.status.name().to_string(),
            }));

        Ok(())
    }

    /// Locks the issue against further mutation.
    pub fn lock(&mut self, reason: Option<String>) -> Result<(), IssueError> {
        self.ensure_unlocked()?;
        self.locked = true;
        self.events.record(IssueEvent::Locked(LockedData { reason }));
        Ok(())
    }

    /// Unlocks the issue. Unlocking an unlocked issue is a no-op.
    pub fn unlock(&mut self) {
        if !self.locked {
            return;
        }
        self.locked = false;
        self.events.record(IssueEvent::Unlocked);
    }

    /// Adds a label. Labels are unique by name.
    pub fn add_label(&mut self, label: Label) -> Result<(), IssueError> {
        self.ensure_unlocked()?;

        if self.has_label(&label.name) {
            return Err(IssueError::DuplicateLabel(label.name));
        }

        self.events.record(IssueEvent::LabelAdded(LabelAddedData {
            name: label.name.clone(),
            color: label.color.clone(),
        }));
        self.labels.push(label);
        Ok(())
    }

    /// Removes the label with the given name.
    pub fn remove_label(&mut self, name: &str) -> Result<(), IssueError> {
        self.ensure_unlocked()?;

        let position = self
            .labels
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| IssueError::LabelNotFound(name.to_string()))?;

        self.labels.remove(position);
        self.events
            .record(IssueEvent::LabelRemoved(LabelRemovedData {
                name: name.to_string(),
            }));
        Ok(())
    }

    /// Changes the assignee. Assigning the current assignee is a no-op.
    pub fn assign(&mut self, assignee: Option<UserId>) -> Result<(), IssueError> {
        self.ensure_unlocked()?;

        if assignee == self.assignee {
            return Ok(());
        }

        let old_assignee = std::mem::replace(&mut self.assignee, assignee);
        self.events
            .record(IssueEvent::AssigneeChanged(AssigneeChangedData {
                old_assignee,
                new_assignee: assignee,
            }));
        Ok(())
    }

    /// Changes the title. Renaming to the current title is a no-op.
    pub fn rename(&mut self, title: impl Into<String>) -> Result<(), IssueError> {
        self.ensure_unlocked()?;

        let title = title.into();
        if title.trim().is_empty() {
            return Err(IssueError::EmptyTitle);
        }
        if title == self.title {
            return Ok(());
        }

        let old_title = std::mem::replace(&mut self.title, title.clone());
        self.events
            .record(IssueEvent::TitleChanged(TitleChangedData {
                old_title,
                new_title: title,
            }));
        Ok(())
    }

    /// Adds a comment to the thread.
    pub fn add_comment(&mut self, author: UserId, body: impl Into<String>) -> Result<EntityId, IssueError> {
        self.ensure_unlocked()?;

        let comment = Comment::new(author, body);
        let comment_id = comment.id;
        self.comments.push(comment);
        self.events
            .record(IssueEvent::CommentAdded(CommentAddedData {
                comment_id,
                author,
            }));
        Ok(comment_id)
    }

    fn ensure_unlocked(&self) -> Result<(), IssueError> {
        if self.locked {
            return Err(IssueError::Locked);
        }
        Ok(())
    }
}

impl DomainEntity for Issue {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    fn drain_event_records(&mut self) -> Result<Vec<EventRecord>, serde_json::Error> {
        self.events
            .drain()
            .iter()
            .map(|event| EventRecord::from_event(self.id, event))
            .collect()
    }
}
