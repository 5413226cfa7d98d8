pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod log;
pub mod storage;
pub mod view;
pub mod voice;

pub use controller::{Effect, Receipt, SubmitCommand, TaskController};
pub use crate::core::{
    CompletionEngine, CompletionState, DependencyStatus, DependencyView, Priority, Task,
    TaskFields, TaskId, TaskStore, Transition,
};
pub use error::{Error, Result};
pub use storage::{JsonFileStorage, MemoryStorage, Storage};
