//! Read-only dependency view over a [`TaskStore`].
//!
//! Gating looks at exactly one level of `depends_on`: a task is blocked when a
//! direct dependency still exists and is incomplete. Transitive closure is
//! never computed for gating. The petgraph projection is only used for cycle
//! diagnostics and the optional cycle rejection on edit.

use petgraph::algo::{has_path_connecting, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

use crate::core::store::TaskStore;
use crate::core::task::{Task, TaskId};

/// Blocked state of one task, as shown next to it in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyStatus {
    pub id: TaskId,
    pub blocked: bool,
    /// Unmet dependencies, in `depends_on` order.
    pub blockers: Vec<TaskId>,
}

/// Borrowed, stateless view of the dependency relation.
#[derive(Debug, Clone, Copy)]
pub struct DependencyView<'a> {
    store: &'a TaskStore,
}

impl<'a> DependencyView<'a> {
    pub fn new(store: &'a TaskStore) -> Self {
        Self { store }
    }

    /// Dependencies of `task` that still exist and are not completed.
    ///
    /// References to deleted tasks count as satisfied.
    pub fn unmet_dependencies(&self, task: &Task) -> Vec<&'a Task> {
        let mut unmet: Vec<&'a Task> = Vec::new();
        for id in &task.depends_on {
            if let Some(dep) = self.store.get(*id) {
                if !dep.completed && !unmet.iter().any(|t| t.id == dep.id) {
                    unmet.push(dep);
                }
            }
        }
        unmet
    }

    pub fn blocker_ids(&self, task: &Task) -> Vec<TaskId> {
        self.unmet_dependencies(task).iter().map(|t| t.id).collect()
    }

    /// A completed task is never blocked; reopening is always allowed.
    pub fn is_blocked(&self, task: &Task) -> bool {
        !task.completed && !self.unmet_dependencies(task).is_empty()
    }

    /// Every task listing `id` in its `depends_on`, in store order.
    pub fn dependents(&self, id: TaskId) -> Vec<&'a Task> {
        self.store
            .all()
            .iter()
            .filter(|t| t.depends_on_id(id))
            .collect()
    }

    /// Blocked state for the task with `id`, if it exists.
    pub fn dependency_status(&self, id: TaskId) -> Option<DependencyStatus> {
        self.store.get(id).map(|task| self.status_of(task))
    }

    pub fn status_of(&self, task: &Task) -> DependencyStatus {
        let blockers = if task.completed {
            Vec::new()
        } else {
            self.blocker_ids(task)
        };
        DependencyStatus {
            id: task.id,
            blocked: !blockers.is_empty(),
            blockers,
        }
    }

    /// Project the store into a graph with an edge dependency -> dependent.
    ///
    /// Edges to ids that are not in the store are skipped.
    pub fn to_digraph(&self) -> (DiGraph<TaskId, ()>, HashMap<TaskId, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for task in self.store.all() {
            index.insert(task.id, graph.add_node(task.id));
        }
        for task in self.store.all() {
            let to = index[&task.id];
            for dep in &task.depends_on {
                if let Some(&from) = index.get(dep) {
                    graph.update_edge(from, to, ());
                }
            }
        }
        (graph, index)
    }

    /// Groups of tasks that depend on each other, directly or transitively.
    ///
    /// Each group is sorted by id; groups are ordered by their smallest id.
    pub fn cycles(&self) -> Vec<Vec<TaskId>> {
        let (graph, _) = self.to_digraph();
        let mut cycles: Vec<Vec<TaskId>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&n| graph.find_edge(n, n).is_some())
            })
            .map(|component| {
                let mut ids: Vec<TaskId> = component.into_iter().map(|n| graph[n]).collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Whether giving task `id` the dependency list `deps` would close a cycle.
    ///
    /// Returns the offending dependencies (those from which `id` is already
    /// reachable), empty when the edit is acyclic.
    pub fn would_create_cycle(&self, id: TaskId, deps: &[TaskId]) -> Vec<TaskId> {
        let (graph, index) = self.to_digraph();
        let Some(&target) = index.get(&id) else {
            // A task that does not exist yet has no dependents.
            return Vec::new();
        };
        deps.iter()
            .copied()
            .filter(|dep| {
                *dep == id
                    || index
                        .get(dep)
                        .is_some_and(|&from| has_path_connecting(&graph, target, from, None))
            })
            .collect()
    }
}
