//! Completion engine: the Incomplete/Complete state machine for one task.
//!
//! Incomplete -> Complete is gated on the task having no unmet dependencies.
//! Complete -> Incomplete is always allowed. After any change the direct
//! dependents are re-evaluated in a single, non-recursive pass.

use serde::Serialize;

use crate::core::graph::{DependencyStatus, DependencyView};
use crate::core::store::TaskStore;
use crate::core::task::TaskId;
use crate::error::{Error, Result};
use crate::{tlog, tlog_trace, tlog_warn};

/// Completion state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    Incomplete,
    Complete,
}

impl CompletionState {
    pub fn from_flag(completed: bool) -> Self {
        if completed {
            Self::Complete
        } else {
            Self::Incomplete
        }
    }

    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Incomplete => Self::Complete,
            Self::Complete => Self::Incomplete,
        }
    }
}

impl std::fmt::Display for CompletionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionState::Incomplete => write!(f, "incomplete"),
            CompletionState::Complete => write!(f, "complete"),
        }
    }
}

/// Outcome of a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub id: TaskId,
    pub from: CompletionState,
    pub to: CompletionState,
    /// Fresh blocked state of every direct dependent.
    pub reevaluated: Vec<DependencyStatus>,
}

impl Transition {
    /// False when the request left the task where it already was.
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Stateless; every operation works against the store it is handed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionEngine;

impl CompletionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Flip the task's completion state, subject to the dependency gate.
    pub fn toggle(&self, store: &mut TaskStore, id: TaskId) -> Result<Transition> {
        let current = self.state_of(store, id)?;
        self.transition(store, id, current.toggled())
    }

    pub fn complete(&self, store: &mut TaskStore, id: TaskId) -> Result<Transition> {
        self.transition(store, id, CompletionState::Complete)
    }

    pub fn reopen(&self, store: &mut TaskStore, id: TaskId) -> Result<Transition> {
        self.transition(store, id, CompletionState::Incomplete)
    }

    pub fn state_of(&self, store: &TaskStore, id: TaskId) -> Result<CompletionState> {
        store
            .get(id)
            .map(|t| CompletionState::from_flag(t.completed))
            .ok_or(Error::NotFound(id))
    }

    /// Check the gate without changing anything.
    pub fn can_complete(&self, store: &TaskStore, id: TaskId) -> Result<()> {
        let task = store.get(id).ok_or(Error::NotFound(id))?;
        if task.completed {
            return Ok(());
        }
        let blockers = DependencyView::new(store).blocker_ids(task);
        if blockers.is_empty() {
            Ok(())
        } else {
            Err(Error::DependencyBlocked {
                id,
                count: blockers.len(),
                blockers,
            })
        }
    }

    fn transition(
        &self,
        store: &mut TaskStore,
        id: TaskId,
        target: CompletionState,
    ) -> Result<Transition> {
        let from = self.state_of(store, id)?;
        if from == target {
            return Ok(Transition {
                id,
                from,
                to: target,
                reevaluated: Vec::new(),
            });
        }

        if target.is_complete() {
            if let Err(err) = self.can_complete(store, id) {
                tlog_warn!("Completion of task {} refused: {}", id, err);
                return Err(err);
            }
        }

        store.set_completed(id, target.is_complete())?;
        tlog!("Task {} marked {}", id, target);

        Ok(Transition {
            id,
            from,
            to: target,
            reevaluated: self.reevaluate_dependents(store, id),
        })
    }

    /// Recompute the blocked state of tasks that depend directly on `id`.
    pub fn reevaluate_dependents(&self, store: &TaskStore, id: TaskId) -> Vec<DependencyStatus> {
        let view = DependencyView::new(store);
        view.dependents(id)
            .into_iter()
            .map(|task| {
                let status = view.status_of(task);
                tlog_trace!(
                    "Dependent {} of {}: blocked={} blockers={:?}",
                    task.id,
                    id,
                    status.blocked,
                    status.blockers
                );
                status
            })
            .collect()
    }
}
