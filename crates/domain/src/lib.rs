//! Domain layer for the issue-tracking consistency core.
//!
//! This crate provides:
//! - [`DomainEvent`] and [`DomainEntity`] traits plus the [`EventRecord`]
//!   carrier handed to dispatch
//! - [`EventBuffer`] for per-entity pending events
//! - [`Repository`] with its statuses and [`TransitionGraph`]
//! - The [`Issue`] entity with guarded, event-buffering mutators
//! - Immutable [`ChangeLog`] audit records

pub mod buffer;
pub mod changelog;
pub mod event;
pub mod issue;
pub mod repository;
pub mod status;
pub mod transitions;
pub mod user;

pub use buffer::EventBuffer;
pub use changelog::{
    AssigneeChangeLog, ChangeLog, LabelChangeLog, LockChangeLog, StatusChangeLog, TitleChangeLog,
};
pub use event::{DomainEntity, DomainEvent, EventRecord};
pub use issue::{Comment, Issue, IssueError, IssueEvent, Label};
pub use repository::{Repository, RepositoryError, RepositoryEvent};
pub use status::IssueStatus;
pub use transitions::TransitionGraph;
pub use user::User;
