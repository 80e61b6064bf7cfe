//! Append-only audit records for issue mutations.

use chrono::{DateTime, Utc};
use common::{EntityId, UserId};
use serde::{Deserialize, Serialize};

/// An immutable audit record of one observable issue mutation.
///
/// Change logs are created by the recorder handlers reacting to domain
/// events; they are never updated or deleted. Each variant carries the
/// issue it belongs to, the acting user and a timestamp alongside the
/// old/new values of the mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum ChangeLog {
    /// The issue's status changed.
    Status(StatusChangeLog),

    /// The issue was locked or unlocked.
    Lock(LockChangeLog),

    /// A label was added to or removed from the issue.
    Label(LabelChangeLog),

    /// The issue's assignee changed.
    Assignee(AssigneeChangeLog),

    /// The issue's title changed.
    Title(TitleChangeLog),
}

/// Audit record for a status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeLog {
    pub issue_id: EntityId,
    pub actor: UserId,
    pub recorded_at: DateTime<Utc>,
    pub old_status_id: EntityId,
    pub old_status: String,
    pub new_status_id: EntityId,
    pub new_status: String,
}

/// Audit record for a lock or unlock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockChangeLog {
    pub issue_id: EntityId,
    pub actor: UserId,
    pub recorded_at: DateTime<Utc>,
    pub locked: bool,
    pub reason: Option<String>,
}

/// Audit record for a label addition or removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelChangeLog {
    pub issue_id: EntityId,
    pub actor: UserId,
    pub recorded_at: DateTime<Utc>,
    pub label: String,
    pub added: bool,
}

/// Audit record for an assignee change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssigneeChangeLog {
    pub issue_id: EntityId,
    pub actor: UserId,
    pub recorded_at: DateTime<Utc>,
    pub old_assignee: Option<UserId>,
    pub new_assignee: Option<UserId>,
}

/// Audit record for a title change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleChangeLog {
    pub issue_id: EntityId,
    pub actor: UserId,
    pub recorded_at: DateTime<Utc>,
    pub old_title: String,
    pub new_title: String,
}

impl ChangeLog {
    /// Returns the issue this record belongs to.
    pub fn issue_id(&self) -> EntityId {
        match self {
            ChangeLog::Status(c) => c.issue_id,
            ChangeLog::Lock(c) => c.issue_id,
            ChangeLog::Label(c) => c.issue_id,
            ChangeLog::Assignee(c) => c.issue_id,
            ChangeLog::Title(c) => c.issue_id,
        }
    }

    /// Returns the acting user.
    pub fn actor(&self) -> UserId {
        match self {
            ChangeLog::Status(c) => c.actor,
            ChangeLog::Lock(c) => c.actor,
            ChangeLog::Label(c) => c.actor,
            ChangeLog::Assignee(c) => c.actor,
            ChangeLog::Title(c) => c.actor,
        }
    }

    /// Returns when the record was created.
    pub fn recorded_at(&self) -> DateTime<Utc> {
        match self {
            ChangeLog::Status(c) => c.recorded_at,
            ChangeLog::Lock(c) => c.recorded_at,
            ChangeLog::Label(c) => c.recorded_at,
            ChangeLog::Assignee(c) => c.recorded_at,
            ChangeLog::Title(c) => c.recorded_at,
        }
    }

    /// Returns the record kind as a string.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeLog::Status(_) => "Status",
            ChangeLog::Lock(_) => "Lock",
            ChangeLog::Label(_) => "Label",
            ChangeLog::Assignee(_) => "Assignee",
            ChangeLog::Title(_) => "Title",
        }
    }
}
