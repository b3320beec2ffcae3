// Project domain module
// Projects own epics, which own features, which own tasks

#![allow(clippy::module_inception)]

pub mod project;

// Re-export main types for convenience
pub use project::{Epic, Feature, Project};
