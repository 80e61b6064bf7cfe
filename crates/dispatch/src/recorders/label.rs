use std::sync::Arc;

use async_trait::async_trait;
use domain::{ChangeLog, EventRecord, IssueEvent, changelog::LabelChangeLog};

use crate::{CurrentUser, DispatchError, EventHandler, FlushContext, Result};

/// Stages a label audit record for additions and removals.
pub struct LabelRecorder {
    current_user: Arc<dyn CurrentUser>,
}

impl LabelRecorder {
    pub fn new(current_user: Arc<dyn CurrentUser>) -> Self {
        Self { current_user }
    }
}

#[async_trait]
impl EventHandler for LabelRecorder {
    async fn handle(&self, record: &EventRecord, ctx: &FlushContext) -> Result<()> {
        let (label, added) = match record.decode()? {
            IssueEvent::LabelAdded(data) => (data.name, true),
            IssueEvent::LabelRemoved(data) => (data.name, false),
            _ => {
                return Err(DispatchError::Handler(format!(
                    "label recorder got {}",
                    record.event_type
                )));
            }
        };

        let actor = self.current_user.current_user().await?.id;
        ctx.stage_change_log(ChangeLog::Label(LabelChangeLog {
            issue_id: record.entity_id,
            actor,
            recorded_at: record.recorded_at,
            label,
            added,
        }))
        .await;

        metrics::counter!("change_logs_recorded_total", "kind" => "Label").increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::EntityId;
    use domain::{
        User,
        issue::{LabelAddedData, LabelRemovedData},
    };

    use super::*;
    use crate::StaticCurrentUser;

    fn recorder() -> LabelRecorder {
        LabelRecorder::new(Arc::new(StaticCurrentUser::new(User::new("ana"))))
    }

    #[tokio::test]
    async fn records_addition_and_removal() {
        let issue_id = EntityId::new();
        let added = EventRecord::from_event(
            issue_id,
            &IssueEvent::LabelAdded(LabelAddedData {
                name: "bug".to_string(),
                color: "#ff0000".to_string(),
            }),
        )
        .unwrap();
        let removed = EventRecord::from_event(
            issue_id,
            &IssueEvent::LabelRemoved(LabelRemovedData {
                name: "bug".to_string(),
            }),
        )
        .unwrap();

        let ctx = FlushContext::new();
        let recorder = recorder();
        recorder.handle(&added, &ctx).await.unwrap();
        recorder.handle(&removed, &ctx).await.unwrap();

        let logs = ctx.take_change_logs().await;
        assert_eq!(logs.len(), 2);
        assert!(matches!(&logs[0], ChangeLog::Label(log) if log.added && log.label == "bug"));
        assert!(matches!(&logs[1], ChangeLog::Label(log) if !log.added && log.label == "bug"));
    }
}
