// Agent domain module
// Contains the agent identity record and its value objects

pub mod agent;
pub mod value_objects;

// Re-export main types for convenience
pub use agent::Agent;
pub use value_objects::{AgentId, AgentRole, AgentStatus, ConnectionType, SkillLevel};
