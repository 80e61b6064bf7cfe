use std::sync::Arc;

use async_trait::async_trait;
use domain::{ChangeLog, EventRecord, IssueEvent, changelog::AssigneeChangeLog};

use crate::{CurrentUser, DispatchError, EventHandler, FlushContext, Result};

/// Stages an assignee audit record.
pub struct AssigneeRecorder {
    current_user: Arc<dyn CurrentUser>,
}

impl AssigneeRecorder {
    pub fn new(current_user: Arc<dyn CurrentUser>) -> Self {
        Self { current_user }
    }
}

#[async_trait]
impl EventHandler for AssigneeRecorder {
    async fn handle(&self, record: &EventRecord, ctx: &FlushContext) -> Result<()> {
        let IssueEvent::AssigneeChanged(data) = record.decode()? else {
            return Err(DispatchError::Handler(format!(
                "assignee recorder got {}",
                record.event_type
            )));
        };

        let actor = self.current_user.current_user().await?.id;
        ctx.stage_change_log(ChangeLog::Assignee(AssigneeChangeLog {
            issue_id: record.entity_id,
            actor,
            recorded_at: record.recorded_at,
            old_assignee: data.old_assignee,
            new_assignee: data.new_assignee,
        }))
        .await;

        metrics::counter!("change_logs_recorded_total", "kind" => "Assignee").increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::{EntityId, UserId};
    use domain::{User, issue::AssigneeChangedData};

    use super::*;
    use crate::StaticCurrentUser;

    #[tokio::test]
    async fn records_old_and_new_assignee() {
        let recorder = AssigneeRecorder::new(Arc::new(StaticCurrentUser::new(User::new("ana"))));
        let new_assignee = UserId::new();
        let event = IssueEvent::AssigneeChanged(AssigneeChangedData {
            old_assignee: None,
            new_assignee: Some(new_assignee),
        });
        let record = EventRecord::from_event(EntityId::new(), &event).unwrap();

        let ctx = FlushContext::new();
        recorder.handle(&record, &ctx).await.unwrap();

        let logs = ctx.take_change_logs().await;
        assert!(matches!(
            &logs[0],
            ChangeLog::Assignee(log)
                if log.old_assignee.is_none() && log.new_assignee == Some(new_assignee)
        ));
    }
}
