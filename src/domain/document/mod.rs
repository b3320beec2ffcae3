// Document domain module
// Free-text communication artifacts and the mentions derived from them

#![allow(clippy::module_inception)]

pub mod document;
pub mod mention;

// Re-export main types for convenience
pub use document::{DocType, Document};
pub use mention::{Mention, SourceType};
