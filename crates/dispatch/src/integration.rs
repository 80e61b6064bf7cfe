//! Integration events announced to other services through the outbox.

use std::sync::Arc;

use async_trait::async_trait;
use common::{EntityId, MessageId, UserId};
use domain::{EventRecord, IssueEvent, repository::RepositoryEvent};
use outbox::IntegrationEvent;
use serde::{Deserialize, Serialize};

use crate::{DispatchError, EventHandler, FlushContext, HandlerRegistry, Result};

/// Announces a newly created repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryCreatedNotification {
    pub message_id: MessageId,
    pub repository_id: EntityId,
    pub name: String,
    pub owner: UserId,
}

impl IntegrationEvent for RepositoryCreatedNotification {
    fn event_type() -> &'static str {
        "RepositoryCreatedNotification"
    }

    fn message_id(&self) -> MessageId {
        self.message_id
    }
}

/// Announces a newly opened issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueOpenedNotification {
    pub message_id: MessageId,
    pub issue_id: EntityId,
    pub repository_id: EntityId,
    pub title: String,
    pub author: UserId,
}

impl IntegrationEvent for IssueOpenedNotification {
    fn event_type() -> &'static str {
        "IssueOpenedNotification"
    }

    fn message_id(&self) -> MessageId {
        self.message_id
    }
}

/// Announces an issue moving between statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueStatusChangedNotification {
    pub message_id: MessageId,
    pub issue_id: EntityId,
    pub old_status: String,
    pub new_status: String,
}

impl IntegrationEvent for IssueStatusChangedNotification {
    fn event_type() -> &'static str {
        "IssueStatusChangedNotification"
    }

    fn message_id(&self) -> MessageId {
        self.message_id
    }
}

/// Translates selected domain events into outbox notifications.
///
/// The notifications are staged on the flush context and only reach the
/// outbox in the second flush, so nothing leaks if a later handler fails.
pub struct NotificationPublisher;

#[async_trait]
impl EventHandler for NotificationPublisher {
    async fn handle(&self, record: &EventRecord, ctx: &FlushContext) -> Result<()> {
        match record.event_type.as_str() {
            "RepositoryCreated" => {
                let RepositoryEvent::Created(data) = record.decode()?;
                ctx.publish(&RepositoryCreatedNotification {
                    message_id: MessageId::new(),
                    repository_id: data.repository_id,
                    name: data.name,
                    owner: data.owner,
                })
                .await?;
            }
            "IssueOpened" => {
                let IssueEvent::Opened(data) = record.decode()? else {
                    return Err(DispatchError::Handler(
                        "issue-opened payload mismatch".to_string(),
                    ));
                };
                ctx.publish(&IssueOpenedNotification {
                    message_id: MessageId::new(),
                    issue_id: data.issue_id,
                    repository_id: data.repository_id,
                    title: data.title,
                    author: data.author,
                })
                .await?;
            }
            "IssueStatusChanged" => {
                let IssueEvent::StatusChanged(data) = record.decode()? else {
                    return Err(DispatchError::Handler(
                        "status-changed payload mismatch".to_string(),
                    ));
                };
                ctx.publish(&IssueStatusChangedNotification {
                    message_id: MessageId::new(),
                    issue_id: record.entity_id,
                    old_status: data.old_status,
                    new_status: data.new_status,
                })
                .await?;
            }
            other => {
                return Err(DispatchError::Handler(format!(
                    "notification publisher got {other}"
                )));
            }
        }

        Ok(())
    }
}

/// Registers the notification publisher under its event types.
pub fn register_notifications(registry: &mut HandlerRegistry) {
    let publisher = Arc::new(NotificationPublisher);
    registry.register("RepositoryCreated", publisher.clone());
    registry.register("IssueOpened", publisher.clone());
    registry.register("IssueStatusChanged", publisher);
}
