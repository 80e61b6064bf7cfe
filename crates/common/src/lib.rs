//! Shared identifier types for the issue-tracking consistency core.

mod types;

pub use types::{EntityId, MessageId, UserId};
