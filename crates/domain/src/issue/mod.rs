//! Issue entity and related types.

mod entity;
mod events;
mod value_objects;

pub use entity::Issue;
pub use events::{
    AssigneeChangedData, CommentAddedData, IssueEvent, IssueOpenedData, LabelAddedData,
    LabelRemovedData, LockedData, StatusChangedData, TitleChangedData,
};
pub use value_objects::{Comment, Label};

use common::EntityId;
use thiserror::Error;

/// Errors that can occur during issue operations.
///
/// All of these are rejected synchronously, before any event is buffered,
/// so a failed mutation leaves no partial state behind.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The issue is locked; only unlock may succeed.
    #[error("Issue is locked")]
    Locked,

    /// The operation targeted a repository other than the issue's own.
    #[error("Repository mismatch: issue belongs to {issue_repository}, got {repository}")]
    RepositoryMismatch {
        issue_repository: EntityId,
        repository: EntityId,
    },

    /// The status id does not resolve within the issue's repository.
    #[error("Status not found: {0}")]
    StatusNotFound(EntityId),

    /// The transition graph forbids this status change.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// A label with the same name is already present.
    #[error("Label already present: {0}")]
    DuplicateLabel(String),

    /// No label with this name is present.
    #[error("Label not found: {0}")]
    LabelNotFound(String),

    /// The title may not be empty.
    #[error("Issue title may not be empty")]
    EmptyTitle,
}
