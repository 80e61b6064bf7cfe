//! Audit recorders.
//!
//! One recorder per audited mutation kind. Each decodes the typed event
//! from the record, resolves the acting user and stages exactly one
//! [`domain::ChangeLog`] on the flush context.

mod assignee;
mod label;
mod lock;
mod status;
mod title;

pub use assignee::AssigneeRecorder;
pub use label::LabelRecorder;
pub use lock::LockRecorder;
pub use status::StatusChangeRecorder;
pub use title::TitleRecorder;

use std::sync::Arc;

use crate::{CurrentUser, HandlerRegistry};

/// Registers every audit recorder under its event types.
pub fn register_recorders(registry: &mut HandlerRegistry, current_user: Arc<dyn CurrentUser>) {
    registry.register(
        "IssueStatusChanged",
        Arc::new(StatusChangeRecorder::new(current_user.clone())),
    );

    let lock = Arc::new(LockRecorder::new(current_user.clone()));
    registry.register("IssueLocked", lock.clone());
    registry.register("IssueUnlocked", lock);

    let label = Arc::new(LabelRecorder::new(current_user.clone()));
    registry.register("IssueLabelAdded", label.clone());
    registry.register("IssueLabelRemoved", label);

    registry.register(
        "IssueAssigneeChanged",
        Arc::new(AssigneeRecorder::new(current_user.clone())),
    );
    registry.register("IssueTitleChanged", Arc::new(TitleRecorder::new(current_user)));
}
