// Coordination engine services
//
// Each service composes domain validation with the repositories' atomic
// primitives. Handlers construct them per request over the shared pool.

pub mod changes;
pub mod locking;
pub mod mentions;
pub mod router;
pub mod status_flow;

// Re-export main types
pub use changes::{ChangeFeed, ChangeSet};
pub use locking::LockManager;
pub use mentions::MentionScanner;
pub use router::TaskRouter;
pub use status_flow::TransitionEngine;
