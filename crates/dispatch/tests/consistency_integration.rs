//! End-to-end tests for the flush pipeline: guarded mutators, audit
//! recorders and outbox staging working together through the services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::EntityId;
use dispatch::{
    DispatchError, EventDispatcher, EventHandler, FlushContext, InMemoryStateStore, IssueService,
    IssueStatusChangedNotification, RepositoryService, ServiceError, StaticCurrentUser,
    default_registry,
};
use domain::{ChangeLog, EventRecord, IssueError, Label, User};
use outbox::{
    EventBus, InMemoryOutboxStore, IntegrationHandler, OutboxProcessor, OutboxStore,
    ProcessorConfig,
};
use tokio::sync::{Mutex, oneshot, watch};

struct Fixture {
    store: Arc<InMemoryStateStore>,
    outbox_store: Arc<InMemoryOutboxStore>,
    bus: Arc<EventBus>,
    repositories: RepositoryService,
    issues: IssueService,
    actor: User,
}

fn fixture() -> Fixture {
    fixture_with(|_| {})
}

fn fixture_with(customize: impl FnOnce(&mut dispatch::HandlerRegistry)) -> Fixture {
    let actor = User::new("ana");
    let current_user: Arc<dyn dispatch::CurrentUser> =
        Arc::new(StaticCurrentUser::new(actor.clone()));

    let mut registry = default_registry(current_user.clone());
    customize(&mut registry);

    let store = Arc::new(InMemoryStateStore::new());
    let outbox_store = Arc::new(InMemoryOutboxStore::new());
    let bus = Arc::new(EventBus::new(outbox_store.clone()));
    let dispatcher = Arc::new(EventDispatcher::new(registry));

    let state: Arc<dyn dispatch::StateStore> = store.clone();
    let repositories = RepositoryService::new(
        state.clone(),
        dispatcher.clone(),
        bus.clone(),
        current_user.clone(),
    );
    let issues = IssueService::new(state, dispatcher, bus.clone(), current_user);

    Fixture {
        store,
        outbox_store,
        bus,
        repositories,
        issues,
        actor,
    }
}

struct Workflow {
    repository_id: EntityId,
    open: EntityId,
    doing: EntityId,
    done: EntityId,
}

async fn seed_workflow(fx: &Fixture) -> Workflow {
    let repository_id = fx.repositories.create_repository("infra").await.unwrap();
    let open = fx
        .repositories
        .add_status(repository_id, "Open", "#00ff00")
        .await
        .unwrap();
    let doing = fx
        .repositories
        .add_status(repository_id, "Doing", "#ffff00")
        .await
        .unwrap();
    let done = fx
        .repositories
        .add_status(repository_id, "Done", "#0000ff")
        .await
        .unwrap();
    fx.repositories
        .add_transition(repository_id, open, doing)
        .await
        .unwrap();
    fx.repositories
        .add_transition(repository_id, doing, done)
        .await
        .unwrap();

    Workflow {
        repository_id,
        open,
        doing,
        done,
    }
}

#[tokio::test]
async fn status_change_writes_audit_and_outbox_atomically() {
    let fx = fixture();
    let wf = seed_workflow(&fx).await;

    let issue_id = fx
        .issues
        .open_issue(wf.repository_id, wf.open, "flaky CI")
        .await
        .unwrap();

    let before = fx.outbox_store.pending_count().await.unwrap();
    fx.issues.transition_issue(issue_id, wf.doing).await.unwrap();

    let logs = fx.issues.change_log(issue_id).await.unwrap();
    assert_eq!(logs.len(), 1);
    match &logs[0] {
        ChangeLog::Status(log) => {
            assert_eq!(log.actor, fx.actor.id);
            assert_eq!(log.old_status, "Open");
            assert_eq!(log.new_status, "Doing");
        }
        other => panic!("unexpected log kind {}", other.kind()),
    }

    // One status-changed notification joined the outbox.
    assert_eq!(fx.outbox_store.pending_count().await.unwrap(), before + 1);

    let issue = fx.issues.get_issue(issue_id).await.unwrap();
    assert_eq!(issue.status().name(), "Doing");
}

#[tokio::test]
async fn rejected_transition_leaves_no_trace() {
    let fx = fixture();
    let wf = seed_workflow(&fx).await;
    let issue_id = fx
        .issues
        .open_issue(wf.repository_id, wf.open, "flaky CI")
        .await
        .unwrap();

    let pending_before = fx.outbox_store.pending_count().await.unwrap();
    let logs_before = fx.store.change_log_count().await;

    // Open -> Done has no edge.
    let result = fx.issues.transition_issue(issue_id, wf.done).await;
    assert!(matches!(
        result,
        Err(ServiceError::Issue(IssueError::InvalidTransition { .. }))
    ));

    assert_eq!(fx.store.change_log_count().await, logs_before);
    assert_eq!(fx.outbox_store.pending_count().await.unwrap(), pending_before);
    let issue = fx.issues.get_issue(issue_id).await.unwrap();
    assert_eq!(issue.status().name(), "Open");
}

#[tokio::test]
async fn removing_a_transition_forbids_it_for_future_moves() {
    let fx = fixture();
    let wf = seed_workflow(&fx).await;
    let issue_id = fx
        .issues
        .open_issue(wf.repository_id, wf.open, "flaky CI")
        .await
        .unwrap();

    fx.repositories
        .remove_transition(wf.repository_id, wf.open, wf.doing)
        .await
        .unwrap();

    let result = fx.issues.transition_issue(issue_id, wf.doing).await;
    assert!(matches!(
        result,
        Err(ServiceError::Issue(IssueError::InvalidTransition { .. }))
    ));
}

#[tokio::test]
async fn locked_issue_mutations_fail_and_audit_the_lock_cycle() {
    let fx = fixture();
    let wf = seed_workflow(&fx).await;
    let issue_id = fx
        .issues
        .open_issue(wf.repository_id, wf.open, "flaky CI")
        .await
        .unwrap();

    fx.issues
        .lock_issue(issue_id, Some("heated".to_string()))
        .await
        .unwrap();

    let result = fx.issues.transition_issue(issue_id, wf.doing).await;
    assert!(matches!(
        result,
        Err(ServiceError::Issue(IssueError::Locked))
    ));
    let result = fx
        .issues
        .add_label(issue_id, Label::new("bug", "#ff0000"))
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Issue(IssueError::Locked))
    ));

    fx.issues.unlock_issue(issue_id).await.unwrap();
    fx.issues.transition_issue(issue_id, wf.doing).await.unwrap();

    let kinds: Vec<_> = fx
        .issues
        .change_log(issue_id)
        .await
        .unwrap()
        .iter()
        .map(ChangeLog::kind)
        .collect();
    assert_eq!(kinds, vec!["Lock", "Lock", "Status"]);
}

#[tokio::test]
async fn audit_trail_is_append_only_and_ordered() {
    let fx = fixture();
    let wf = seed_workflow(&fx).await;
    let issue_id = fx
        .issues
        .open_issue(wf.repository_id, wf.open, "flaky CI")
        .await
        .unwrap();

    fx.issues
        .add_label(issue_id, Label::new("bug", "#ff0000"))
        .await
        .unwrap();
    fx.issues
        .assign_issue(issue_id, Some(fx.actor.id))
        .await
        .unwrap();
    fx.issues
        .rename_issue(issue_id, "flaky CI on main")
        .await
        .unwrap();
    fx.issues.remove_label(issue_id, "bug").await.unwrap();

    let logs = fx.issues.change_log(issue_id).await.unwrap();
    let kinds: Vec<_> = logs.iter().map(ChangeLog::kind).collect();
    assert_eq!(kinds, vec!["Label", "Assignee", "Title", "Label"]);

    // Timestamps never go backwards along the trail.
    for pair in logs.windows(2) {
        assert!(pair[0].recorded_at() <= pair[1].recorded_at());
    }
}

#[tokio::test]
async fn noop_mutations_write_nothing() {
    let fx = fixture();
    let wf = seed_workflow(&fx).await;
    let issue_id = fx
        .issues
        .open_issue(wf.repository_id, wf.open, "flaky CI")
        .await
        .unwrap();

    let pending_before = fx.outbox_store.pending_count().await.unwrap();

    // Same status, same title, same (absent) assignee, unlock while unlocked.
    fx.issues.transition_issue(issue_id, wf.open).await.unwrap();
    fx.issues.rename_issue(issue_id, "flaky CI").await.unwrap();
    fx.issues.assign_issue(issue_id, None).await.unwrap();
    fx.issues.unlock_issue(issue_id).await.unwrap();

    assert!(fx.issues.change_log(issue_id).await.unwrap().is_empty());
    assert_eq!(fx.outbox_store.pending_count().await.unwrap(), pending_before);
}

#[tokio::test]
async fn reloaded_entities_do_not_redispatch_old_events() {
    let fx = fixture();
    let wf = seed_workflow(&fx).await;
    let issue_id = fx
        .issues
        .open_issue(wf.repository_id, wf.open, "flaky CI")
        .await
        .unwrap();
    fx.issues.transition_issue(issue_id, wf.doing).await.unwrap();

    let logs_before = fx.store.change_log_count().await;
    let pending_before = fx.outbox_store.pending_count().await.unwrap();

    // A later no-op load/save cycle must not replay the transition.
    fx.issues.unlock_issue(issue_id).await.unwrap();

    assert_eq!(fx.store.change_log_count().await, logs_before);
    assert_eq!(fx.outbox_store.pending_count().await.unwrap(), pending_before);
}

#[tokio::test]
async fn handler_failure_discards_everything_staged() {
    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn handle(
            &self,
            _record: &EventRecord,
            _ctx: &FlushContext,
        ) -> Result<(), DispatchError> {
            Err(DispatchError::Handler("downstream unavailable".to_string()))
        }
    }

    // The failing handler registers after the recorder, so the recorder
    // has already staged its log when the failure hits.
    let fx = fixture_with(|registry| {
        registry.register("IssueTitleChanged", Arc::new(Failing));
    });
    let wf = seed_workflow(&fx).await;
    let issue_id = fx
        .issues
        .open_issue(wf.repository_id, wf.open, "flaky CI")
        .await
        .unwrap();

    let result = fx.issues.rename_issue(issue_id, "renamed").await;
    assert!(matches!(
        result,
        Err(ServiceError::Dispatch(DispatchError::Handler(_)))
    ));

    // The staged title log never reached the store.
    assert!(fx.issues.change_log(issue_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn staged_notifications_reach_subscribers_through_the_processor() {
    #[derive(Default)]
    struct Delivered {
        notes: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl IntegrationHandler for Delivered {
        async fn handle(&self, payload: serde_json::Value) -> Result<(), outbox::OutboxError> {
            let event: IssueStatusChangedNotification = serde_json::from_value(payload)?;
            self.notes
                .lock()
                .await
                .push((event.old_status, event.new_status));
            Ok(())
        }
    }

    #[derive(Default)]
    struct CreatedNames {
        names: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl IntegrationHandler for CreatedNames {
        async fn handle(&self, payload: serde_json::Value) -> Result<(), outbox::OutboxError> {
            let event: dispatch::RepositoryCreatedNotification = serde_json::from_value(payload)?;
            self.names.lock().await.push(event.name);
            Ok(())
        }
    }

    let delivered = Arc::new(Delivered::default());
    let created = Arc::new(CreatedNames::default());

    // Wire the fixture by hand so the subscriptions land before the bus
    // is shared with the services and the processor.
    let actor = User::new("ana");
    let current_user: Arc<dyn dispatch::CurrentUser> =
        Arc::new(StaticCurrentUser::new(actor.clone()));
    let store = Arc::new(InMemoryStateStore::new());
    let outbox_store = Arc::new(InMemoryOutboxStore::new());
    let mut bus = EventBus::new(outbox_store.clone());
    bus.subscribe::<IssueStatusChangedNotification>(delivered.clone());
    bus.subscribe::<dispatch::RepositoryCreatedNotification>(created.clone());
    let bus = Arc::new(bus);
    let dispatcher = Arc::new(EventDispatcher::new(default_registry(current_user.clone())));

    let state: Arc<dyn dispatch::StateStore> = store.clone();
    let fx = Fixture {
        store,
        outbox_store,
        bus: bus.clone(),
        repositories: RepositoryService::new(
            state.clone(),
            dispatcher.clone(),
            bus.clone(),
            current_user.clone(),
        ),
        issues: IssueService::new(state, dispatcher, bus.clone(), current_user),
        actor,
    };

    let wf = seed_workflow(&fx).await;
    let issue_id = fx
        .issues
        .open_issue(wf.repository_id, wf.open, "flaky CI")
        .await
        .unwrap();
    fx.issues.transition_issue(issue_id, wf.doing).await.unwrap();
    fx.issues.transition_issue(issue_id, wf.done).await.unwrap();

    let (started_tx, started_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let processor = OutboxProcessor::new(
        fx.bus.clone(),
        ProcessorConfig {
            batch_size: 10,
            poll_interval: Duration::from_millis(10),
        },
    );
    let task = tokio::spawn(processor.run(started_rx, shutdown_rx));
    started_tx.send(()).unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while delivered.notes.lock().await.len() < 2 || created.names.lock().await.is_empty() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "notifications not delivered within 5s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(
        *delivered.notes.lock().await,
        vec![
            ("Open".to_string(), "Doing".to_string()),
            ("Doing".to_string(), "Done".to_string()),
        ]
    );
    assert_eq!(*created.names.lock().await, vec!["infra"]);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn cross_repository_transition_is_rejected() {
    let fx = fixture();
    let wf = seed_workflow(&fx).await;
    let other = seed_workflow(&fx).await;

    let issue_id = fx
        .issues
        .open_issue(wf.repository_id, wf.open, "flaky CI")
        .await
        .unwrap();

    // The target status belongs to another repository entirely.
    let result = fx.issues.transition_issue(issue_id, other.doing).await;
    assert!(matches!(
        result,
        Err(ServiceError::Issue(IssueError::StatusNotFound(_)))
    ));
}
