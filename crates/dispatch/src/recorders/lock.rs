use std::sync::Arc;

use async_trait::async_trait;
use domain::{ChangeLog, EventRecord, IssueEvent, changelog::LockChangeLog};

use crate::{CurrentUser, DispatchError, EventHandler, FlushContext, Result};

/// Stages a lock audit record for both locks and unlocks.
///
/// Registered under both event types; the variant decides the `locked`
/// flag of the record.
pub struct LockRecorder {
    current_user: Arc<dyn CurrentUser>,
}

impl LockRecorder {
    pub fn new(current_user: Arc<dyn CurrentUser>) -> Self {
        Self { current_user }
    }
}

#[async_trait]
impl EventHandler for LockRecorder {
    async fn handle(&self, record: &EventRecord, ctx: &FlushContext) -> Result<()> {
        let (locked, reason) = match record.decode()? {
            IssueEvent::Locked(data) => (true, data.reason),
            IssueEvent::Unlocked => (false, None),
            _ => {
                return Err(DispatchError::Handler(format!(
                    "lock recorder got {}",
                    record.event_type
                )));
            }
        };

        let actor = self.current_user.current_user().await?.id;
        ctx.stage_change_log(ChangeLog::Lock(LockChangeLog {
            issue_id: record.entity_id,
            actor,
            recorded_at: record.recorded_at,
            locked,
            reason,
        }))
        .await;

        metrics::counter!("change_logs_recorded_total", "kind" => "Lock").increment(1);
        Ok(())
    }
}
