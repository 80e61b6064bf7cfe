//! Value objects attached to an issue.

use chrono::{DateTime, Utc};
use common::{EntityId, UserId};
use serde::{Deserialize, Serialize};

/// A label on an issue. Labels are unique by name within one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name, the uniqueness key.
    pub name: String,

    /// Display color.
    pub color: String,
}

impl Label {
    /// Creates a new label.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A comment on an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier.
    pub id: EntityId,

    /// The commenting user.
    pub author: UserId,

    /// Comment body.
    pub body: String,

    /// When the comment was written.
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Creates a new comment with a fresh id.
    pub fn new(author: UserId, body: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            author,
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}
