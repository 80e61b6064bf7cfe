//! Directed transition graph over a repository's statuses.

use std::collections::HashSet;

use common::EntityId;
use serde::{Deserialize, Serialize};

/// The set of legal status transitions within one repository.
///
/// Edges are kept in a single set keyed by `(from, to)`; the outgoing and
/// incoming views are derived by filtering rather than maintained as
/// parallel adjacency lists, so the two views cannot drift apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionGraph {
    edges: HashSet<(EntityId, EntityId)>,
}

impl TransitionGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directed edge from one status to another.
    ///
    /// Returns true if the edge was not already present.
    pub fn add_transition(&mut self, from: EntityId, to: EntityId) -> bool {
        self.edges.insert((from, to))
    }

    /// Removes a directed edge.
    ///
    /// Returns true if the edge was present.
    pub fn remove_transition(&mut self, from: EntityId, to: EntityId) -> bool {
        self.edges.remove(&(from, to))
    }

    /// Returns true if moving from `current` to `target` is legal.
    ///
    /// A self-transition is always allowed (and is a no-op for the issue);
    /// anything else requires an explicit edge.
    pub fn can_transition(&self, current: EntityId, target: EntityId) -> bool {
        current == target || self.edges.contains(&(current, target))
    }

    /// Returns true if the exact edge exists.
    pub fn contains(&self, from: EntityId, to: EntityId) -> bool {
        self.edges.contains(&(from, to))
    }

    /// Statuses reachable in one step from `from`.
    pub fn outgoing(&self, from: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.edges
            .iter()
            .filter(move |(f, _)| *f == from)
            .map(|(_, t)| *t)
    }

    /// Statuses with an edge into `to`.
    pub fn incoming(&self, to: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.edges
            .iter()
            .filter(move |(_, t)| *t == to)
            .map(|(f, _)| *f)
    }

    /// Returns the number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
