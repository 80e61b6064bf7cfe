//! Repository entity owning statuses and their transition graph.

use std::collections::HashMap;

use common::{EntityId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::EventBuffer;
use crate::event::{DomainEntity, DomainEvent, EventRecord};
use crate::status::IssueStatus;
use crate::transitions::TransitionGraph;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The status id does not resolve within this repository.
    #[error("Status not found: {0}")]
    StatusNotFound(EntityId),

    /// A status with the same name already exists.
    #[error("Duplicate status name: {0}")]
    DuplicateStatus(String),
}

/// Events produced by repository mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RepositoryEvent {
    /// The repository was created.
    Created(RepositoryCreatedData),
}

/// Data for the repository-created event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryCreatedData {
    pub repository_id: EntityId,
    pub name: String,
    pub owner: UserId,
}

impl DomainEvent for RepositoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RepositoryEvent::Created(_) => "RepositoryCreated",
        }
    }
}

/// A hosted repository together with its issue workflow.
///
/// The repository owns its statuses and the transition graph between them,
/// so an edge's endpoints structurally belong to the same repository and
/// cross-repository edges cannot be expressed at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    id: EntityId,
    name: String,
    owner: UserId,
    statuses: HashMap<EntityId, IssueStatus>,
    transitions: TransitionGraph,

    #[serde(skip)]
    events: EventBuffer<RepositoryEvent>,
}

impl Repository {
    /// Creates a new repository, buffering a created event.
    pub fn create(name: impl Into<String>, owner: UserId) -> Self {
        let id = EntityId::new();
        let name = name.into();

        let mut repository = Self {
            id,
            name: name.clone(),
            owner,
            statuses: HashMap::new(),
            transitions: TransitionGraph::new(),
            events: EventBuffer::new(),
        };

        repository
            .events
            .record(RepositoryEvent::Created(RepositoryCreatedData {
                repository_id: id,
                name,
                owner,
            }));

        repository
    }

    /// Returns the repository identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the repository name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning user.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Adds a status to the workflow.
    ///
    /// Status names are unique within a repository.
    pub fn add_status(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Result<EntityId, RepositoryError> {
        let name = name.into();
        if self.statuses.values().any(|s| s.name() == name) {
            return Err(RepositoryError::DuplicateStatus(name));
        }

        let status = IssueStatus::new(self.id, name, color);
        let status_id = status.id();
        self.statuses.insert(status_id, status);
        Ok(status_id)
    }

    /// Resolves a status by id.
    pub fn status(&self, status_id: EntityId) -> Option<&IssueStatus> {
        self.statuses.get(&status_id)
    }

    /// Resolves a status by name.
    pub fn status_by_name(&self, name: &str) -> Option<&IssueStatus> {
        self.statuses.values().find(|s| s.name() == name)
    }

    /// Returns all statuses in the workflow.
    pub fn statuses(&self) -> impl Iterator<Item = &IssueStatus> {
        self.statuses.values()
    }

    /// Adds a directed transition between two owned statuses.
    ///
    /// Both endpoints must resolve within this repository.
    pub fn add_transition(&mut self, from: EntityId, to: EntityId) -> Result<(), RepositoryError> {
        if !self.statuses.contains_key(&from) {
            return Err(RepositoryError::StatusNotFound(from));
        }
        if !self.statuses.contains_key(&to) {
            return Err(RepositoryError::StatusNotFound(to));
        }

        self.transitions.add_transition(from, to);
        Ok(())
    }

    /// Removes a directed transition.
    ///
    /// Returns true if the edge was present.
    pub fn remove_transition(&mut self, from: EntityId, to: EntityId) -> bool {
        self.transitions.remove_transition(from, to)
    }

    /// Returns true if moving from `current` to `target` is legal.
    pub fn can_transition(&self, current: EntityId, target: EntityId) -> bool {
        self.transitions.can_transition(current, target)
    }

    /// Returns the transition graph.
    pub fn transitions(&self) -> &TransitionGraph {
        &self.transitions
    }
}

impl DomainEntity for Repository {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    fn drain_event_records(&mut self) -> Result<Vec<EventRecord>, serde_json::Error> {
        self.events
            .drain()
            .iter()
            .map(|event| EventRecord::from_event(self.id, event))
            .collect()
    }
}
