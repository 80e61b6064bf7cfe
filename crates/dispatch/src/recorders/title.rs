use std::sync::Arc;

use async_trait::async_trait;
use domain::{ChangeLog, EventRecord, IssueEvent, changelog::TitleChangeLog};

use crate::{CurrentUser, DispatchError, EventHandler, FlushContext, Result};

/// Stages a title audit record.
pub struct TitleRecorder {
    current_user: Arc<dyn CurrentUser>,
}

impl TitleRecorder {
    pub fn new(current_user: Arc<dyn CurrentUser>) -> Self {
        Self { current_user }
    }
}

#[async_trait]
impl EventHandler for TitleRecorder {
    async fn handle(&self, record: &EventRecord, ctx: &FlushContext) -> Result<()> {
        let IssueEvent::TitleChanged(data) = record.decode()? else {
            return Err(DispatchError::Handler(format!(
                "title recorder got {}",
                record.event_type
            )));
        };

        let actor = self.current_user.current_user().await?.id;
        ctx.stage_change_log(ChangeLog::Title(TitleChangeLog {
            issue_id: record.entity_id,
            actor,
            recorded_at: record.recorded_at,
            old_title: data.old_title,
            new_title: data.new_title,
        }))
        .await;

        metrics::counter!("change_logs_recorded_total", "kind" => "Title").increment(1);
        Ok(())
    }
}
