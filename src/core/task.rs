//! Task data model.
//!
//! A task carries descriptive metadata (category, priority, due date) plus the
//! two fields the dependency core cares about: `depends_on` and `completed`.
//! The serialized form uses the camelCase field names of the task list file.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Unique identifier for a task.
///
/// Allocated from the store's monotonic counter and never reused. Serialized
/// as a JSON integer; a decimal string is accepted on input as well. Other
/// string ids are renumbered by the store when a file is imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(TaskId(n)),
            RawId::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Descriptive priority tag. Has no effect on ordering or gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::Validation(format!(
                "Unknown priority '{}' (expected Low, Medium or High)",
                other
            ))),
        }
    }
}

/// Reads any casing; an empty string means the default.
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Ok(Priority::default());
        }
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Field values submitted from a form or voice entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskFields {
    pub text: String,
    pub category: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub depends_on: Vec<TaskId>,
}

impl TaskFields {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn depends_on(mut self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        self.depends_on = ids.into_iter().collect();
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }
}

/// A single task in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub due_date: Option<NaiveDate>,
    /// Tasks that must be completed before this one may be.
    #[serde(default)]
    pub depends_on: Vec<TaskId>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create an incomplete task from submitted fields.
    pub fn new(id: TaskId, fields: TaskFields) -> Self {
        let mut task = Self {
            id,
            text: String::new(),
            category: String::new(),
            priority: Priority::default(),
            due_date: None,
            depends_on: Vec::new(),
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
        };
        task.apply(fields);
        task
    }

    /// Overwrite every mutable field, keeping id, completion and timestamps.
    pub fn apply(&mut self, fields: TaskFields) {
        self.text = fields.text;
        self.category = fields.category;
        self.priority = fields.priority;
        self.due_date = fields.due_date;
        self.depends_on = normalize_dependencies(self.id, fields.depends_on);
    }

    /// Current field values, e.g. to pre-fill an edit form.
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            text: self.text.clone(),
            category: self.category.clone(),
            priority: self.priority,
            due_date: self.due_date,
            depends_on: self.depends_on.clone(),
        }
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_incomplete(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }

    pub fn depends_on_id(&self, id: TaskId) -> bool {
        self.depends_on.contains(&id)
    }

    /// Past its due date and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }
}

/// Drop duplicate ids (first occurrence wins) and any reference to `own`.
pub fn normalize_dependencies(own: TaskId, ids: Vec<TaskId>) -> Vec<TaskId> {
    let mut out: Vec<TaskId> = Vec::with_capacity(ids.len());
    for id in ids {
        if id != own && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn empty_date_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
