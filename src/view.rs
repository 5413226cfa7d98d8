//! Read-only projections of the store for display.
//!
//! Nothing here is ever read back as data; the store stays the source of truth.

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::graph::DependencyView;
use crate::core::store::TaskStore;
use crate::core::task::{Priority, Task, TaskId};

/// One row of the task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    pub task: Task,
    pub blocked: bool,
    pub blockers: Vec<TaskId>,
    pub overdue: bool,
}

/// Completed/total counts for the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn of(store: &TaskStore) -> Self {
        Self {
            completed: store.all().iter().filter(|t| t.completed).count(),
            total: store.len(),
        }
    }

    /// Completion ratio in percent, 0 for an empty list.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {} tasks completed", self.completed, self.total)
    }
}

pub fn task_views(store: &TaskStore, today: NaiveDate) -> Vec<TaskView> {
    let view = DependencyView::new(store);
    store
        .all()
        .iter()
        .map(|task| {
            let status = view.status_of(task);
            TaskView {
                task: task.clone(),
                blocked: status.blocked,
                blockers: status.blockers,
                overdue: task.is_overdue(today),
            }
        })
        .collect()
}

/// Search and filter criteria for the list command.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring of the task text.
    pub search: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub blocked_only: bool,
}

impl TaskFilter {
    pub fn matches(&self, row: &TaskView) -> bool {
        if let Some(search) = &self.search {
            if !row
                .task
                .text
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !row.task.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if self.priority.is_some_and(|p| p != row.task.priority) {
            return false;
        }
        !self.blocked_only || row.blocked
    }

    pub fn apply(&self, rows: Vec<TaskView>) -> Vec<TaskView> {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}
