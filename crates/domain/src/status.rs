//! Issue status owned by a repository.

use common::EntityId;
use serde::{Deserialize, Serialize};

/// A named status in a repository's workflow.
///
/// Every status belongs to exactly one repository; transitions between
/// statuses are recorded on the owning repository's [`TransitionGraph`]
/// rather than on the status itself.
///
/// [`TransitionGraph`]: crate::transitions::TransitionGraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueStatus {
    id: EntityId,
    repository_id: EntityId,
    name: String,
    color: String,
    disabled: bool,
}

impl IssueStatus {
    /// Creates a new status for the given repository.
    pub fn new(
        repository_id: EntityId,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            repository_id,
            name: name.into(),
            color: color.into(),
            disabled: false,
        }
    }

    /// Returns the status identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the id of the owning repository.
    pub fn repository_id(&self) -> EntityId {
        self.repository_id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display color.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Returns true if the status is disabled for new issues.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Disables the status for new issues.
    pub fn disable(&mut self) {
        self.disabled = true;
    }

    /// Re-enables the status.
    pub fn enable(&mut self) {
        self.disabled = false;
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
