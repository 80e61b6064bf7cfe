use std::sync::Arc;

use async_trait::async_trait;
use domain::{ChangeLog, EventRecord, IssueEvent, changelog::StatusChangeLog};

use crate::{CurrentUser, DispatchError, EventHandler, FlushContext, Result};

/// Stages a status audit record for every status change.
pub struct StatusChangeRecorder {
    current_user: Arc<dyn CurrentUser>,
}

impl StatusChangeRecorder {
    pub fn new(current_user: Arc<dyn CurrentUser>) -> Self {
        Self { current_user }
    }
}

#[async_trait]
impl EventHandler for StatusChangeRecorder {
    async fn handle(&self, record: &EventRecord, ctx: &FlushContext) -> Result<()> {
        let IssueEvent::StatusChanged(data) = record.decode()? else {
            return Err(DispatchError::Handler(format!(
                "status recorder got {}",
                record.event_type
            )));
        };

        let actor = self.current_user.current_user().await?.id;
        ctx.stage_change_log(ChangeLog::Status(StatusChangeLog {
            issue_id: record.entity_id,
            actor,
            recorded_at: record.recorded_at,
            old_status_id: data.old_status_id,
            old_status: data.old_status,
            new_status_id: data.new_status_id,
            new_status: data.new_status,
        }))
        .await;

        metrics::counter!("change_logs_recorded_total", "kind" => "Status").increment(1);
        Ok(())
    }
}
