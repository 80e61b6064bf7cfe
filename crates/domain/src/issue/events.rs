//! Issue domain events.

use common::{EntityId, UserId};
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

/// Events that can occur on an issue.
///
/// Events carry the old and new values of the mutation but no timestamp;
/// structural equality is what lets the buffer suppress duplicates, and
/// the dispatch record stamps the time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum IssueEvent {
    /// The issue was opened.
    Opened(IssueOpenedData),

    /// The issue's status changed.
    StatusChanged(StatusChangedData),

    /// The issue was locked.
    Locked(LockedData),

    /// The issue was unlocked.
    Unlocked,

    /// A label was added.
    LabelAdded(LabelAddedData),

    /// A label was removed.
    LabelRemoved(LabelRemovedData),

    /// The assignee changed.
    AssigneeChanged(AssigneeChangedData),

    /// The title changed.
    TitleChanged(TitleChangedData),

    /// A comment was added.
    CommentAdded(CommentAddedData),
}

impl DomainEvent for IssueEvent {
    fn event_type(&self) -> &'static str {
        match self {
            IssueEvent::Opened(_) => "IssueOpened",
            IssueEvent::StatusChanged(_) => "IssueStatusChanged",
            IssueEvent::Locked(_) => "IssueLocked",
            IssueEvent::Unlocked => "IssueUnlocked",
            IssueEvent::LabelAdded(_) => "IssueLabelAdded",
            IssueEvent::LabelRemoved(_) => "IssueLabelRemoved",
            IssueEvent::AssigneeChanged(_) => "IssueAssigneeChanged",
            IssueEvent::TitleChanged(_) => "IssueTitleChanged",
            IssueEvent::CommentAdded(_) => "IssueCommentAdded",
        }
    }
}

/// Data for the issue-opened event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueOpenedData {
    pub issue_id: EntityId,
    pub repository_id: EntityId,
    pub title: String,
    pub status_id: EntityId,
    pub author: UserId,
}

/// Data for the status-changed event, carrying old and new status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangedData {
    pub old_status_id: EntityId,
    pub old_status: String,
    pub new_status_id: EntityId,
    pub new_status: String,
}

/// Data for the locked event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedData {
    pub reason: Option<String>,
}

/// Data for the label-added event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelAddedData {
    pub name: String,
    pub color: String,
}

/// Data for the label-removed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRemovedData {
    pub name: String,
}

/// Data for the assignee-changed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssigneeChangedData {
    pub old_assignee: Option<UserId>,
    pub new_assignee: Option<UserId>,
}

/// Data for the title-changed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleChangedData {
    pub old_title: String,
    pub new_title: String,
}

/// Data for the comment-added event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAddedData {
    pub comment_id: EntityId,
    pub author: UserId,
}
