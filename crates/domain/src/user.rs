//! User account record.

use common::UserId;
use serde::{Deserialize, Serialize};

/// A user account, as resolved by the current-user capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The account identifier.
    pub id: UserId,

    /// Unique login name.
    pub username: String,
}

impl User {
    /// Creates a new user with a fresh id.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
        }
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}
