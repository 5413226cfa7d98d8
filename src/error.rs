use thiserror::Error;

use crate::core::task::TaskId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Task {id} is blocked by {count} unfinished task(s)")]
    DependencyBlocked {
        id: TaskId,
        count: usize,
        blockers: Vec<TaskId>,
    },

    #[error("Dependency cycle through tasks {}", join_ids(.0))]
    DependencyCycle(Vec<TaskId>),

    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl Error {
    /// Text shown to the user at the boundary where the action originated.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::NotFound(id) => format!("Task {} no longer exists; nothing changed", id),
            Error::DependencyBlocked {
                id,
                count,
                blockers,
            } => {
                let noun = if *count == 1 { "task" } else { "tasks" };
                format!(
                    "Cannot complete task {}: blocked by {} unfinished {} ({})",
                    id,
                    count,
                    noun,
                    join_ids(blockers)
                )
            }
            Error::DependencyCycle(ids) => format!(
                "Those dependencies would form a cycle ({}); pick different ones",
                join_ids(ids)
            ),
            Error::Persistence(msg) => format!(
                "Changes were kept in memory but could not be saved and may not survive a restart: {}",
                msg
            ),
            other => other.to_string(),
        }
    }
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
