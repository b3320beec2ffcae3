use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::mentions::MentionResponse;
use super::parse_agent_id;
use super::tasks::TaskResponse;
use crate::api::errors::ApiError;
use crate::api::middleware::ApiKeyAuth;
use crate::coordination::ChangeFeed;

#[derive(Debug, Deserialize)]
pub struct ChangesQuery {
    pub since: String,
    pub agent_id: String,
    pub project_id: Option<Uuid>,
}

/// Delta of everything that changed since the caller's cursor
#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    pub tasks: Vec<TaskResponse>,
    pub mentions: Vec<MentionResponse>,
    pub timestamp: DateTime<Utc>,
}

/// Poll for changes since a cursor
///
/// GET /api/changes?since=&agent_id=&project_id=
///
/// `timestamp` in the response is the caller's next `since` value and
/// must be treated as opaque.
pub async fn poll_changes(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Query(query): Query<ChangesQuery>,
) -> Result<Json<ChangesResponse>, ApiError> {
    let agent_id = parse_agent_id(&query.agent_id)?;
    let since = DateTime::parse_from_rfc3339(&query.since)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::bad_request(format!("Invalid since timestamp: {}", e)))?;

    let feed = ChangeFeed::new(pool);
    let changes = feed.poll(since, &agent_id, query.project_id).await?;

    Ok(Json(ChangesResponse {
        tasks: changes.tasks.iter().map(TaskResponse::from).collect(),
        mentions: changes.mentions.iter().map(MentionResponse::from).collect(),
        timestamp: changes.timestamp,
    }))
}
