use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::agent::{Agent, AgentId};
use crate::domain::errors::CoordinationResult;

/// Repository trait for Agent records
///
/// Defines the contract for persisting and retrieving agents.
/// Implementations should handle database-specific details.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Register or refresh an agent (upsert keyed on agent_id)
    async fn upsert(&self, agent: &Agent) -> CoordinationResult<()>;

    /// Find an agent by its handle
    async fn find_by_id(&self, agent_id: &AgentId) -> CoordinationResult<Option<Agent>>;

    /// List all registered agents
    async fn list(&self) -> CoordinationResult<Vec<Agent>>;

    /// Bump an agent's last_activity timestamp
    async fn touch_activity(&self, agent_id: &AgentId, at: DateTime<Utc>) -> CoordinationResult<()>;

    /// Hard-delete an agent record; fails with NotFound for unknown handles
    async fn delete(&self, agent_id: &AgentId) -> CoordinationResult<()>;
}
