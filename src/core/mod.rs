//! Core domain: tasks, the store that owns them, the dependency view and the
//! completion state machine.

pub mod completion;
pub mod graph;
pub mod store;
pub mod task;

pub use completion::{CompletionEngine, CompletionState, Transition};
pub use graph::{DependencyStatus, DependencyView};
pub use store::{StoreSnapshot, TaskStore};
pub use task::{Priority, Task, TaskFields, TaskId};
