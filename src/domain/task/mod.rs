// Task domain module
// Contains the task aggregate root, the status state machine, and the
// changelog audit record

#![allow(clippy::module_inception)]

pub mod changelog;
pub mod task;
pub mod value_objects;

// Re-export main types for convenience
pub use changelog::ChangelogEntry;
pub use task::Task;
pub use value_objects::{Complexity, TaskStatus};
