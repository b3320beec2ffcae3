use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_agent_id, require_manager};
use crate::api::errors::ApiError;
use crate::api::middleware::ApiKeyAuth;
use crate::domain::agent::{Agent, AgentRole, AgentStatus, ConnectionType, SkillLevel};
use crate::domain::repositories::AgentRepository;
use crate::infrastructure::repositories::SqliteAgentRepository;

/// Request body for agent registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub agent_id: String,
    pub role: String,
    pub skill_level: String,
    pub connection_type: String,
}

/// Agent representation returned by the API
#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub agent_id: String,
    pub role: AgentRole,
    pub skill_level: SkillLevel,
    pub status: AgentStatus,
    pub current_task_id: Option<Uuid>,
    pub connection_type: ConnectionType,
    pub last_activity: DateTime<Utc>,
    pub registered_at: DateTime<Utc>,
}

impl From<&Agent> for AgentResponse {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.agent_id.to_string(),
            role: agent.role,
            skill_level: agent.skill_level,
            status: agent.status,
            current_task_id: agent.current_task_id,
            connection_type: agent.connection_type,
            last_activity: agent.last_activity,
            registered_at: agent.registered_at,
        }
    }
}

/// Register or refresh an agent
///
/// POST /api/agents/register
///
/// Upsert semantics: re-registering an existing agent_id updates its
/// metadata rather than failing.
pub async fn register(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AgentResponse>), ApiError> {
    let agent_id = parse_agent_id(&req.agent_id)?;
    let role: AgentRole = req.role.parse().map_err(ApiError::bad_request)?;
    let skill_level: SkillLevel = req.skill_level.parse().map_err(ApiError::bad_request)?;
    let connection_type: ConnectionType =
        req.connection_type.parse().map_err(ApiError::bad_request)?;

    let agent = Agent::register(agent_id.clone(), role, skill_level, connection_type);

    let repo = SqliteAgentRepository::new(pool);
    repo.upsert(&agent).await?;

    // Re-read so a refreshed registration reports its original
    // registered_at and current status.
    let stored = repo
        .find_by_id(&agent_id)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("agent vanished after upsert"))?;

    Ok((StatusCode::CREATED, Json(AgentResponse::from(&stored))))
}

/// List all registered agents
///
/// GET /api/agents
pub async fn list_agents(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<AgentResponse>>, ApiError> {
    let repo = SqliteAgentRepository::new(pool);
    let agents = repo.list().await?;

    Ok(Json(agents.iter().map(AgentResponse::from).collect()))
}

/// Get an agent by handle
///
/// GET /api/agents/:id
pub async fn get_agent(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Json<AgentResponse>, ApiError> {
    let agent_id = parse_agent_id(&id)?;

    let repo = SqliteAgentRepository::new(pool);
    let agent = repo
        .find_by_id(&agent_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("agent {}", agent_id)))?;

    Ok(Json(AgentResponse::from(&agent)))
}

#[derive(Debug, Deserialize)]
pub struct ActingAgentQuery {
    pub agent_id: String,
}

/// Hard-delete an agent record (manager only)
///
/// DELETE /api/agents/:id?agent_id=
pub async fn delete_agent(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
    Query(query): Query<ActingAgentQuery>,
) -> Result<StatusCode, ApiError> {
    let target = parse_agent_id(&id)?;
    let acting = parse_agent_id(&query.agent_id)?;

    require_manager(&pool, &acting).await?;

    let repo = SqliteAgentRepository::new(pool);
    repo.delete(&target).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
