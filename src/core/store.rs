//! The task store: exclusive owner of the live tasks.
//!
//! The store knows nothing about dependency semantics beyond offering a purge
//! helper; deciding when to call it is the controller's job.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::task::{normalize_dependencies, Task, TaskFields, TaskId};
use crate::error::{Error, Result};
use crate::{tlog_debug, tlog_warn};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted form of the whole store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub version: u32,
    pub next_id: u64,
    pub tasks: Vec<Task>,
}

impl StoreSnapshot {
    /// Parse either a versioned snapshot or a bare array of tasks.
    ///
    /// Records whose id is a non-numeric string are given fresh numeric ids
    /// above every id already in the file.
    pub fn from_json(contents: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(contents)?;

        if let Value::Array(records) = &mut value {
            remap_text_ids(records, 0)?;
        }
        if value.is_array() {
            let tasks: Vec<Task> = serde_json::from_value(value)?;
            return Ok(StoreSnapshot {
                version: SNAPSHOT_VERSION,
                next_id: 0,
                tasks,
            });
        }

        let floor = value
            .get("nextId")
            .and_then(Value::as_u64)
            .map_or(0, |next| next.saturating_sub(1));
        if let Some(Value::Array(records)) = value.get_mut("tasks") {
            remap_text_ids(records, floor)?;
        }
        Ok(serde_json::from_value(value)?)
    }
}

fn numeric_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_id(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| s.trim().parse::<u64>().is_err())
}

/// Replace non-numeric string ids with ids above `floor` and every numeric id,
/// rewriting `dependsOn` entries that name them. Text references that match no
/// record are dropped.
fn remap_text_ids(records: &mut [Value], floor: u64) -> Result<()> {
    let mut next = records
        .iter()
        .filter_map(|r| r.get("id").and_then(numeric_id))
        .fold(floor, u64::max);
    let mut mapping: HashMap<String, u64> = HashMap::new();

    for record in records.iter_mut() {
        let Some(text) = record.get("id").and_then(text_id).map(str::to_string) else {
            continue;
        };
        let id = match mapping.get(&text) {
            Some(&id) => id,
            None => {
                next = next.checked_add(1).ok_or_else(|| id_space_exhausted(next))?;
                mapping.insert(text.clone(), next);
                next
            }
        };
        tlog_debug!("Imported task id {:?} as {}", text, id);
        record["id"] = Value::from(id);
    }
    if mapping.is_empty() {
        return Ok(());
    }

    for record in records.iter_mut() {
        if let Some(Value::Array(deps)) = record.get_mut("dependsOn") {
            deps.retain_mut(|dep| {
                let Some(text) = text_id(dep) else {
                    return true;
                };
                match mapping.get(text).copied() {
                    Some(id) => {
                        *dep = Value::from(id);
                        true
                    }
                    None => false,
                }
            });
        }
    }
    tlog_warn!("Assigned numeric ids to {} text id(s) on import", mapping.len());
    Ok(())
}

fn id_space_exhausted(last: u64) -> Error {
    Error::Validation(format!(
        "Task id {} leaves no room for new task ids",
        last
    ))
}

/// Owns every live task, in insertion order.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a store from persisted data.
    ///
    /// Duplicate ids keep their first record. Dependency references to ids that
    /// are not in the snapshot are pruned, and the id counter is moved past
    /// every id seen so nothing is ever reissued.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        let mut tasks: Vec<Task> = Vec::with_capacity(snapshot.tasks.len());
        for task in snapshot.tasks {
            if tasks.iter().any(|t| t.id == task.id) {
                tlog_warn!("Dropping duplicate task record with id {}", task.id);
                continue;
            }
            tasks.push(task);
        }

        let max_id = tasks.iter().map(|t| t.id.0).max().unwrap_or(0);
        let after_max = max_id
            .checked_add(1)
            .ok_or_else(|| id_space_exhausted(max_id))?;
        let next_id = snapshot.next_id.max(after_max).max(1);

        let live: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        let mut pruned = 0usize;
        for task in &mut tasks {
            let before = task.depends_on.len();
            let own = task.id;
            let deps = std::mem::take(&mut task.depends_on);
            task.depends_on = normalize_dependencies(own, deps)
                .into_iter()
                .filter(|id| live.contains(id))
                .collect();
            pruned += before - task.depends_on.len();
        }
        if pruned > 0 {
            tlog_warn!("Pruned {} stale dependency reference(s) on load", pruned);
        }

        tlog_debug!(
            "TaskStore::from_snapshot tasks={} next_id={}",
            tasks.len(),
            next_id
        );
        Ok(Self { tasks, next_id })
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            version: SNAPSHOT_VERSION,
            next_id: self.next_id,
            tasks: self.tasks.clone(),
        }
    }

    /// Store a new incomplete task under a fresh id.
    pub fn create(&mut self, fields: TaskFields) -> Result<&Task> {
        let id = TaskId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| id_space_exhausted(id.0))?;
        tlog_debug!("TaskStore::create id={}", id);
        self.tasks.push(Task::new(id, fields));
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Replace all mutable fields of an existing task.
    pub fn update(&mut self, id: TaskId, fields: TaskFields) -> Result<&Task> {
        let task = self.get_mut(id).ok_or(Error::NotFound(id))?;
        task.apply(fields);
        tlog_debug!("TaskStore::update id={}", id);
        Ok(task)
    }

    /// Remove a task record. Other tasks' `depends_on` are left untouched.
    pub fn delete(&mut self, id: TaskId) -> Result<Task> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::NotFound(id))?;
        tlog_debug!("TaskStore::delete id={}", id);
        Ok(self.tasks.remove(pos))
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The id the next `create` will assign.
    pub fn next_id(&self) -> TaskId {
        TaskId(self.next_id)
    }

    pub(crate) fn set_completed(&mut self, id: TaskId, completed: bool) -> Result<&Task> {
        let task = self.get_mut(id).ok_or(Error::NotFound(id))?;
        if completed {
            task.mark_completed();
        } else {
            task.mark_incomplete();
        }
        Ok(task)
    }

    /// Remove `id` from every task's `depends_on`. Returns the tasks touched.
    pub fn remove_dependency_refs(&mut self, id: TaskId) -> Vec<TaskId> {
        let mut touched = Vec::new();
        for task in &mut self.tasks {
            if task.depends_on_id(id) {
                task.depends_on.retain(|dep| *dep != id);
                touched.push(task.id);
            }
        }
        touched
    }
}
