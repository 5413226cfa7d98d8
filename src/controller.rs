//! Task lifecycle controller.
//!
//! Entry point for every user action. Validates input, mutates the store,
//! keeps dependency references consistent, persists the whole list and
//! reports what the presentation layer should refresh.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::core::completion::{CompletionEngine, Transition};
use crate::core::graph::{DependencyStatus, DependencyView};
use crate::core::store::TaskStore;
use crate::core::task::{Task, TaskFields, TaskId};
use crate::storage::Storage;
use crate::view::{self, Progress, TaskView};
use crate::voice::VoiceCommandParser;
use crate::{tlog, tlog_debug, tlog_error, tlog_warn, Error, Result};

/// What a form submission should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitCommand {
    Create,
    Update(TaskId),
}

/// Side effects of a successful operation, for the caller to act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "effect")]
pub enum Effect {
    /// The full list was written to storage.
    Persisted,
    /// Writing failed; the in-memory list is still authoritative.
    PersistenceFailed { message: String },
    /// The set of selectable dependencies changed.
    RefreshDependencySelector,
    /// Fresh blocked state of tasks affected by the change.
    Reevaluated { statuses: Vec<DependencyStatus> },
}

/// Result value plus the effects the operation produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt<T> {
    pub value: T,
    pub effects: Vec<Effect>,
}

impl<T> Receipt<T> {
    pub fn persisted(&self) -> bool {
        self.effects.contains(&Effect::Persisted)
    }

    /// Message for the user when the save step failed.
    pub fn persistence_warning(&self) -> Option<String> {
        self.effects.iter().find_map(|e| match e {
            Effect::PersistenceFailed { message } => {
                Some(Error::Persistence(message.clone()).user_message())
            }
            _ => None,
        })
    }

    pub fn reevaluated(&self) -> &[DependencyStatus] {
        self.effects
            .iter()
            .find_map(|e| match e {
                Effect::Reevaluated { statuses } => Some(statuses.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn refresh_selector(&self) -> bool {
        self.effects.contains(&Effect::RefreshDependencySelector)
    }
}

pub struct TaskController<S: Storage> {
    store: TaskStore,
    engine: CompletionEngine,
    storage: S,
    config: Config,
    voice: VoiceCommandParser,
}

impl<S: Storage> TaskController<S> {
    /// Load the stored list (or start empty) and wrap it in a controller.
    pub fn open(storage: S, config: Config) -> Result<Self> {
        let store = match storage.load()? {
            Some(snapshot) => TaskStore::from_snapshot(snapshot)?,
            None => TaskStore::new(),
        };
        Self::with_store(store, storage, config)
    }

    pub fn with_store(store: TaskStore, storage: S, config: Config) -> Result<Self> {
        let voice = VoiceCommandParser::new(&config.voice_keywords)?;
        tlog_debug!("TaskController ready with {} task(s)", store.len());
        Ok(Self {
            store,
            engine: CompletionEngine::new(),
            storage,
            config,
            voice,
        })
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Single submit entry point for the task form.
    pub fn submit(&mut self, command: SubmitCommand, fields: TaskFields) -> Result<Receipt<Task>> {
        match command {
            SubmitCommand::Create => self.create_task(fields),
            SubmitCommand::Update(id) => self.edit_task(id, fields),
        }
    }

    pub fn create_task(&mut self, fields: TaskFields) -> Result<Receipt<Task>> {
        let own = self.store.next_id();
        let fields = self.validate(own, fields)?;
        let task = self.store.create(fields)?.clone();
        tlog!("Created task {} '{}'", task.id, task.text);

        let mut effects = Vec::new();
        self.persist(&mut effects);
        effects.push(Effect::RefreshDependencySelector);
        Ok(Receipt {
            value: task,
            effects,
        })
    }

    /// Create a task from a speech transcript, dropping the command keyword.
    pub fn create_from_voice(&mut self, transcript: &str) -> Result<Receipt<Task>> {
        let text = self.voice.task_text(transcript);
        tlog_debug!("Voice transcript {:?} -> {:?}", transcript, text);
        self.create_task(TaskFields::new(&text).priority(self.config.default_priority))
    }

    /// Current values of a task, for pre-filling an edit form.
    pub fn edit_form(&self, id: TaskId) -> Result<TaskFields> {
        self.store
            .get(id)
            .map(Task::fields)
            .ok_or(Error::NotFound(id))
    }

    pub fn edit_task(&mut self, id: TaskId, fields: TaskFields) -> Result<Receipt<Task>> {
        if !self.store.contains(id) {
            return Err(Error::NotFound(id));
        }
        let fields = self.validate(id, fields)?;
        let task = self.store.update(id, fields)?.clone();
        tlog!("Edited task {} '{}'", task.id, task.text);

        let view = DependencyView::new(&self.store);
        let mut statuses = vec![view.status_of(&task)];
        statuses.extend(self.engine.reevaluate_dependents(&self.store, id));

        let mut effects = vec![Effect::Reevaluated { statuses }];
        self.persist(&mut effects);
        Ok(Receipt {
            value: task,
            effects,
        })
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<Receipt<Task>> {
        let removed = self.store.delete(id)?;
        let touched = self.store.remove_dependency_refs(id);
        tlog!(
            "Deleted task {} '{}', released {} dependent(s)",
            removed.id,
            removed.text,
            touched.len()
        );

        let mut effects = vec![Effect::Reevaluated {
            statuses: self.statuses(&touched),
        }];
        self.persist(&mut effects);
        effects.push(Effect::RefreshDependencySelector);
        Ok(Receipt {
            value: removed,
            effects,
        })
    }

    /// Flip completion. A refused completion returns `Error::DependencyBlocked`
    /// and leaves the task unchanged.
    pub fn toggle_completion(&mut self, id: TaskId) -> Result<Receipt<Transition>> {
        let transition = self.engine.toggle(&mut self.store, id)?;
        let mut effects = vec![Effect::Reevaluated {
            statuses: transition.reevaluated.clone(),
        }];
        self.persist(&mut effects);
        Ok(Receipt {
            value: transition,
            effects,
        })
    }

    /// Delete every completed task at once.
    pub fn clear_completed(&mut self) -> Result<Receipt<Vec<TaskId>>> {
        let done: Vec<TaskId> = self
            .store
            .all()
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id)
            .collect();

        let mut touched: Vec<TaskId> = Vec::new();
        for id in &done {
            self.store.delete(*id)?;
            for dependent in self.store.remove_dependency_refs(*id) {
                if !touched.contains(&dependent) {
                    touched.push(dependent);
                }
            }
        }
        touched.retain(|id| self.store.contains(*id));
        tlog!("Cleared {} completed task(s)", done.len());

        let mut effects = vec![Effect::Reevaluated {
            statuses: self.statuses(&touched),
        }];
        self.persist(&mut effects);
        effects.push(Effect::RefreshDependencySelector);
        Ok(Receipt {
            value: done,
            effects,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.all()
    }

    pub fn task_views(&self, today: NaiveDate) -> Vec<TaskView> {
        view::task_views(&self.store, today)
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.store)
    }

    pub fn dependency_status(&self, id: TaskId) -> Result<DependencyStatus> {
        DependencyView::new(&self.store)
            .dependency_status(id)
            .ok_or(Error::NotFound(id))
    }

    /// Tasks that list `id` as a dependency, in store order.
    pub fn dependents(&self, id: TaskId) -> Vec<TaskId> {
        DependencyView::new(&self.store)
            .dependents(id)
            .iter()
            .map(|t| t.id)
            .collect()
    }

    pub fn cycles(&self) -> Vec<Vec<TaskId>> {
        DependencyView::new(&self.store).cycles()
    }

    fn statuses(&self, ids: &[TaskId]) -> Vec<DependencyStatus> {
        let view = DependencyView::new(&self.store);
        ids.iter()
            .filter_map(|id| view.dependency_status(*id))
            .collect()
    }

    /// Trim text, fill defaults and resolve the dependency selection for `own`.
    fn validate(&self, own: TaskId, mut fields: TaskFields) -> Result<TaskFields> {
        fields.text = fields.text.trim().to_string();
        if fields.text.is_empty() {
            return Err(Error::Validation("Task text cannot be empty".to_string()));
        }

        fields.category = fields.category.trim().to_string();
        if fields.category.is_empty() {
            fields.category = self.config.default_category.clone();
        }

        let requested = fields.depends_on.len();
        let mut depends_on: Vec<TaskId> = Vec::with_capacity(requested);
        for id in fields.depends_on {
            if id != own && self.store.contains(id) && !depends_on.contains(&id) {
                depends_on.push(id);
            }
        }
        if depends_on.len() != requested {
            tlog_warn!(
                "Task {}: ignored {} dependency selection(s) (self, duplicate or unknown)",
                own,
                requested - depends_on.len()
            );
        }

        if self.config.reject_cycles {
            let offending = DependencyView::new(&self.store).would_create_cycle(own, &depends_on);
            if !offending.is_empty() {
                let mut ids = vec![own];
                ids.extend(offending);
                return Err(Error::DependencyCycle(ids));
            }
        }

        fields.depends_on = depends_on;
        Ok(fields)
    }

    fn persist(&self, effects: &mut Vec<Effect>) {
        match self.storage.save(&self.store.snapshot()) {
            Ok(()) => effects.push(Effect::Persisted),
            Err(err) => {
                tlog_error!("Failed to persist task list: {}", err);
                effects.push(Effect::PersistenceFailed {
                    message: err.to_string(),
                });
            }
        }
    }
}
