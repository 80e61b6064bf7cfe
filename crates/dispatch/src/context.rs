use domain::{ChangeLog, EventRecord};
use outbox::{IntegrationEvent, OutboxMessage};
use tokio::sync::RwLock;

use crate::Result;

#[derive(Default)]
struct Staged {
    change_logs: Vec<ChangeLog>,
    messages: Vec<OutboxMessage>,
    follow_ups: Vec<EventRecord>,
}

/// Per-flush staging area shared by every handler of one dispatch.
///
/// Handlers never write to storage directly; they stage change logs,
/// outbox messages and follow-up events here, and the service persists
/// everything staged in one second flush after dispatch completes. A
/// handler error throws the whole context away, staged work included.
#[derive(Default)]
pub struct FlushContext {
    staged: RwLock<Staged>,
}

impl FlushContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an audit record for the second flush.
    pub async fn stage_change_log(&self, log: ChangeLog) {
        self.staged.write().await.change_logs.push(log);
    }

    /// Stages an integration event for the outbox.
    pub async fn publish<E: IntegrationEvent>(&self, event: &E) -> Result<()> {
        let message = OutboxMessage::from_event(event)?;
        self.staged.write().await.messages.push(message);
        Ok(())
    }

    /// Stages a follow-up domain event for the next dispatch pass.
    pub async fn record_follow_up(&self, record: EventRecord) {
        self.staged.write().await.follow_ups.push(record);
    }

    /// Returns true if anything is staged for the second flush.
    pub async fn has_staged(&self) -> bool {
        let staged = self.staged.read().await;
        !staged.change_logs.is_empty() || !staged.messages.is_empty()
    }

    /// Returns true if follow-up events are waiting for another pass.
    pub async fn has_follow_ups(&self) -> bool {
        !self.staged.read().await.follow_ups.is_empty()
    }

    /// Takes the staged audit records, leaving the context empty of them.
    pub async fn take_change_logs(&self) -> Vec<ChangeLog> {
        std::mem::take(&mut self.staged.write().await.change_logs)
    }

    /// Takes the staged outbox messages.
    pub async fn take_messages(&self) -> Vec<OutboxMessage> {
        std::mem::take(&mut self.staged.write().await.messages)
    }

    /// Takes the staged follow-up events.
    pub async fn take_follow_ups(&self) -> Vec<EventRecord> {
        std::mem::take(&mut self.staged.write().await.follow_ups)
    }
}

#[cfg(test)]
mod tests {
    use common::{EntityId, UserId};
    use domain::changelog::TitleChangeLog;

    use super::*;

    fn title_log() -> ChangeLog {
        ChangeLog::Title(TitleChangeLog {
            issue_id: EntityId::new(),
            actor: UserId::new(),
            recorded_at: chrono::Utc::now(),
            old_title: "a".to_string(),
            new_title: "b".to_string(),
        })
    }

    #[tokio::test]
    async fn staging_and_taking() {
        let ctx = FlushContext::new();
        assert!(!ctx.has_staged().await);

        ctx.stage_change_log(title_log()).await;
        assert!(ctx.has_staged().await);

        let logs = ctx.take_change_logs().await;
        assert_eq!(logs.len(), 1);
        assert!(!ctx.has_staged().await);
    }

    #[tokio::test]
    async fn follow_ups_do_not_count_as_staged_output() {
        let ctx = FlushContext::new();
        let record = EventRecord {
            entity_id: EntityId::new(),
            event_type: "IssueUnlocked".to_string(),
            payload: serde_json::json!({ "type": "Unlocked" }),
            recorded_at: chrono::Utc::now(),
        };

        ctx.record_follow_up(record).await;
        assert!(ctx.has_follow_ups().await);
        assert!(!ctx.has_staged().await);

        assert_eq!(ctx.take_follow_ups().await.len(), 1);
        assert!(!ctx.has_follow_ups().await);
    }
}
