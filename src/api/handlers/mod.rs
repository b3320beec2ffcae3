pub mod agents;
pub mod changes;
pub mod documents;
pub mod mentions;
pub mod projects;
pub mod tasks;

use sqlx::SqlitePool;

use crate::api::errors::ApiError;
use crate::domain::agent::{AgentId, AgentRole};
use crate::domain::repositories::AgentRepository;
use crate::infrastructure::repositories::SqliteAgentRepository;

/// Validates a caller-supplied agent handle
pub(crate) fn parse_agent_id(raw: &str) -> Result<AgentId, ApiError> {
    AgentId::new(raw).map_err(ApiError::bad_request)
}

/// Gate for administrative operations: the acting agent must exist and
/// carry the manager role
pub(crate) async fn require_manager(
    pool: &SqlitePool,
    agent_id: &AgentId,
) -> Result<(), ApiError> {
    let repo = SqliteAgentRepository::new(pool.clone());
    let agent = repo
        .find_by_id(agent_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("agent {}", agent_id)))?;

    if agent.role != AgentRole::Manager {
        return Err(ApiError::forbidden("manager role required"));
    }

    Ok(())
}
