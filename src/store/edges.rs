//! Dependency edges between items.
//!
//! The graph is bookkeeping only. Cycles are not detected, endpoints are
//! not checked against the edge's thread, and nothing here schedules work.
//! [`EdgesModel::are_dependencies_satisfied`] answers a readiness question
//! for callers that do.

use crate::error::Result;
use crate::model::{DagEdge, DagStructure, Edge, EdgeType, NewEdge};
use crate::storage::backend::{Backend, Condition};
use crate::store::factory::{ModelFactory, take_first};
use std::collections::HashSet;
use std::ops::Deref;

/// Edge operations. Derefs to the generic [`ModelFactory`].
#[derive(Debug)]
pub struct EdgesModel<'db, B: Backend + ?Sized> {
    base: ModelFactory<'db, Edge, B>,
}

impl<'db, B: Backend + ?Sized> Deref for EdgesModel<'db, B> {
    type Target = ModelFactory<'db, Edge, B>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl<'db, B: Backend + ?Sized> EdgesModel<'db, B> {
    pub const fn new(backend: &'db B) -> Self {
        Self {
            base: ModelFactory::new(backend),
        }
    }

    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn list_by_thread(&self, thread_id: &str) -> Result<Vec<Edge>> {
        self.base.select(&[Condition::eq("thread_id", thread_id)])
    }

    /// Incoming edges: what `to_item_id` depends on.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn get_dependencies(&self, to_item_id: &str) -> Result<Vec<Edge>> {
        self.base.select(&[Condition::eq("to_item_id", to_item_id)])
    }

    /// Outgoing edges: what depends on `from_item_id`.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn get_dependents(&self, from_item_id: &str) -> Result<Vec<Edge>> {
        self.base.select(&[Condition::eq("from_item_id", from_item_id)])
    }

    /// Record `from -> to`.
    ///
    /// The items are expected to belong to `thread_id` but this is not
    /// checked; the edge is listed under `thread_id` either way.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank ids, or a backend error
    /// (including a foreign key failure for unknown items).
    pub fn add_dependency(
        &self,
        thread_id: &str,
        from_item_id: &str,
        to_item_id: &str,
        request_id: &str,
        edge_type: EdgeType,
    ) -> Result<Edge> {
        let edge = NewEdge {
            thread_id: thread_id.to_string(),
            from_item_id: from_item_id.to_string(),
            to_item_id: to_item_id.to_string(),
            edge_type,
            request_id: request_id.to_string(),
        };
        take_first(self.base.insert(vec![edge])?, "edge")
    }

    /// Nodes and edges of a thread's graph, for rendering.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn get_dag_structure(&self, thread_id: &str) -> Result<DagStructure> {
        let edges = self.list_by_thread(thread_id)?;

        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for edge in &edges {
            for id in [&edge.from_item_id, &edge.to_item_id] {
                if seen.insert(id.as_str()) {
                    nodes.push(id.clone());
                }
            }
        }

        Ok(DagStructure {
            nodes,
            edges: edges
                .iter()
                .map(|e| DagEdge {
                    from: e.from_item_id.clone(),
                    to: e.to_item_id.clone(),
                    edge_type: e.edge_type,
                })
                .collect(),
        })
    }

    /// True when every item `to_item_id` depends on is in `completed`.
    /// Vacuously true for an item with no dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    pub fn are_dependencies_satisfied(&self, to_item_id: &str, completed: &HashSet<String>) -> Result<bool> {
        Ok(self
            .get_dependencies(to_item_id)?
            .iter()
            .all(|dep| completed.contains(&dep.from_item_id)))
    }
}
