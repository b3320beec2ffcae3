use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::parse_agent_id;
use crate::api::errors::ApiError;
use crate::api::middleware::ApiKeyAuth;
use crate::coordination::MentionScanner;
use crate::domain::agent::AgentRole;
use crate::domain::document::{Mention, SourceType};
use crate::domain::repositories::{AgentRepository, MentionRepository};
use crate::infrastructure::repositories::{SqliteAgentRepository, SqliteMentionRepository};

/// Mention representation returned by the API
#[derive(Debug, Serialize)]
pub struct MentionResponse {
    pub id: Uuid,
    pub mentioned_agent_id: String,
    pub source_type: SourceType,
    pub source_id: Uuid,
    pub created_by: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Mention> for MentionResponse {
    fn from(mention: &Mention) -> Self {
        Self {
            id: mention.id,
            mentioned_agent_id: mention.mentioned_agent_id.to_string(),
            source_type: mention.source_type,
            source_id: mention.source_id,
            created_by: mention.created_by.to_string(),
            is_read: mention.is_read,
            created_at: mention.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MentionsQuery {
    pub agent_id: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub include_read: bool,
}

/// Query mentions by recipient or by recipient role, newest first
///
/// GET /api/mentions?agent_id=|role=&include_read=
pub async fn get_mentions(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Query(query): Query<MentionsQuery>,
) -> Result<Json<Vec<MentionResponse>>, ApiError> {
    let repo = SqliteMentionRepository::new(pool.clone());

    let mentions = match (query.agent_id, query.role) {
        (Some(agent_id), None) => {
            let agent_id = parse_agent_id(&agent_id)?;

            let agent_repo = SqliteAgentRepository::new(pool);
            agent_repo
                .find_by_id(&agent_id)
                .await?
                .ok_or_else(|| ApiError::not_found(format!("agent {}", agent_id)))?;

            repo.for_agent(&agent_id, query.include_read).await?
        }
        (None, Some(role)) => {
            let role: AgentRole = role.parse().map_err(ApiError::bad_request)?;
            repo.for_role(role, query.include_read).await?
        }
        _ => {
            return Err(ApiError::bad_request(
                "Exactly one of agent_id or role is required",
            ));
        }
    };

    Ok(Json(mentions.iter().map(MentionResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct ActingAgentQuery {
    pub agent_id: String,
}

/// Mark a mention read
///
/// POST /api/mentions/:id/read?agent_id=
///
/// 403 unless the caller is the mentioned agent; idempotent otherwise.
pub async fn mark_read(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActingAgentQuery>,
) -> Result<Json<MentionResponse>, ApiError> {
    let agent_id = parse_agent_id(&query.agent_id)?;

    let scanner = MentionScanner::new(pool);
    let mention = scanner.mark_read(id, &agent_id).await?;

    Ok(Json(MentionResponse::from(&mention)))
}
