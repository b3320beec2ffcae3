use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::mentions::MentionResponse;
use super::{parse_agent_id, require_manager};
use crate::api::errors::ApiError;
use crate::api::middleware::ApiKeyAuth;
use crate::coordination::{LockManager, TaskRouter, TransitionEngine};
use crate::domain::agent::{AgentRole, SkillLevel};
use crate::domain::document::SourceType;
use crate::domain::repositories::{AgentRepository, ProjectRepository, TaskRepository};
use crate::domain::task::{ChangelogEntry, Complexity, Task, TaskStatus};
use crate::infrastructure::repositories::{
    SqliteAgentRepository, SqliteProjectRepository, SqliteTaskRepository,
};

/// Request body for creating a task
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub feature_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_role: String,
    pub difficulty: String,
    pub complexity: String,
    pub branch_name: Option<String>,
    pub created_by: String,
}

/// Task representation returned by the API
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub feature_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_role: AgentRole,
    pub difficulty: SkillLevel,
    pub complexity: Complexity,
    pub branch_name: Option<String>,
    pub status: TaskStatus,
    pub locked_by: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            feature_id: task.feature_id(),
            title: task.title().to_string(),
            description: task.description().map(String::from),
            target_role: task.target_role(),
            difficulty: task.difficulty(),
            complexity: task.complexity(),
            branch_name: task.branch_name().map(String::from),
            status: task.status(),
            locked_by: task.locked_by().map(|a| a.to_string()),
            locked_at: task.locked_at(),
            notes: task.notes().map(String::from),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// Changelog row returned by the API
#[derive(Debug, Serialize)]
pub struct ChangelogResponse {
    pub id: Uuid,
    pub task_id: Uuid,
    pub old_status: Option<TaskStatus>,
    pub new_status: TaskStatus,
    pub changed_by: String,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl From<&ChangelogEntry> for ChangelogResponse {
    fn from(entry: &ChangelogEntry) -> Self {
        Self {
            id: entry.id,
            task_id: entry.task_id,
            old_status: entry.old_status,
            new_status: entry.new_status,
            changed_by: entry.changed_by.to_string(),
            notes: entry.notes.clone(),
            changed_at: entry.changed_at,
        }
    }
}

/// Create a new task
///
/// POST /api/tasks
///
/// The task starts in `created` status; its initial changelog row is
/// written in the same unit of work.
pub async fn create_task(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let created_by = parse_agent_id(&req.created_by)?;
    let target_role: AgentRole = req.target_role.parse().map_err(ApiError::bad_request)?;
    let difficulty: SkillLevel = req.difficulty.parse().map_err(ApiError::bad_request)?;
    let complexity: Complexity = req.complexity.parse().map_err(ApiError::bad_request)?;

    let agent_repo = SqliteAgentRepository::new(pool.clone());
    agent_repo
        .find_by_id(&created_by)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("agent {}", created_by)))?;

    let project_repo = SqliteProjectRepository::new(pool.clone());
    project_repo
        .find_feature(req.feature_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("feature {}", req.feature_id)))?;

    let (task, initial) = Task::new(
        req.feature_id,
        req.title,
        req.description,
        target_role,
        difficulty,
        complexity,
        req.branch_name,
        &created_by,
    )
    .map_err(ApiError::bad_request)?;

    let task_repo = SqliteTaskRepository::new(pool);
    task_repo.create(&task, &initial).await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(&task))))
}

#[derive(Debug, Deserialize)]
pub struct NextTaskQuery {
    pub role: String,
    pub level: String,
    pub project_id: Option<Uuid>,
}

/// Select the next eligible task for an agent
///
/// GET /api/tasks/next?role=&level=&project_id=
///
/// Read-only: a returned task is not reserved for the caller. A `null`
/// body is a legitimate empty result, not an error.
pub async fn next_task(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Query(query): Query<NextTaskQuery>,
) -> Result<Json<Option<TaskResponse>>, ApiError> {
    let role: AgentRole = query.role.parse().map_err(ApiError::bad_request)?;
    let level: SkillLevel = query.level.parse().map_err(ApiError::bad_request)?;

    let router = TaskRouter::new(pool);
    let task = router.next_task(role, level, query.project_id).await?;

    Ok(Json(task.as_ref().map(TaskResponse::from)))
}

/// Get a task by ID
///
/// GET /api/tasks/:id
pub async fn get_task(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskResponse>, ApiError> {
    let repo = SqliteTaskRepository::new(pool);
    let task = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("task {}", id)))?;

    Ok(Json(TaskResponse::from(&task)))
}

/// List the tasks in a feature
///
/// GET /api/features/:id/tasks
pub async fn list_feature_tasks(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(feature_id): Path<Uuid>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let project_repo = SqliteProjectRepository::new(pool.clone());
    project_repo
        .find_feature(feature_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("feature {}", feature_id)))?;

    let repo = SqliteTaskRepository::new(pool);
    let tasks = repo.list_by_feature(feature_id).await?;

    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct ActingAgentQuery {
    pub agent_id: String,
}

/// Acquire the exclusive lock on a task
///
/// POST /api/tasks/:id/lock?agent_id=
///
/// Succeeds idempotently when the caller already holds the lock; 409
/// when another agent does.
pub async fn lock_task(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActingAgentQuery>,
) -> Result<Json<TaskResponse>, ApiError> {
    let agent_id = parse_agent_id(&query.agent_id)?;

    let locks = LockManager::new(pool);
    let task = locks.lock(id, &agent_id).await?;

    Ok(Json(TaskResponse::from(&task)))
}

/// Request body for a status transition
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

/// Apply a status transition
///
/// PUT /api/tasks/:id/status?agent_id=
pub async fn update_status(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActingAgentQuery>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let agent_id = parse_agent_id(&query.agent_id)?;
    let status: TaskStatus = req.status.parse().map_err(ApiError::bad_request)?;

    let engine = TransitionEngine::new(pool);
    let task = engine.transition(id, &agent_id, status, req.notes).await?;

    Ok(Json(TaskResponse::from(&task)))
}

/// Request body for a task comment
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// Response from commenting on a task
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub task: TaskResponse,
    pub mentions: Vec<MentionResponse>,
}

/// Append a comment to a task and scan it for mentions
///
/// POST /api/tasks/:id/comment?agent_id=
///
/// The comment lands in the task's notes and bumps `updated_at`, so
/// pollers observe it.
pub async fn comment_task(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActingAgentQuery>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let agent_id = parse_agent_id(&query.agent_id)?;
    if req.content.trim().is_empty() {
        return Err(ApiError::bad_request("Comment cannot be empty"));
    }

    let agent_repo = SqliteAgentRepository::new(pool.clone());
    agent_repo
        .find_by_id(&agent_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("agent {}", agent_id)))?;

    let now = Utc::now();
    let line = format!(
        "[{} {}] {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        agent_id,
        req.content
    );

    let task_repo = SqliteTaskRepository::new(pool.clone());
    let task = task_repo
        .append_note(id, &line, now)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("task {}", id)))?;

    let scanner = crate::coordination::MentionScanner::new(pool);
    let mentions = scanner
        .scan_and_record(SourceType::Task, id, &agent_id, &req.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            task: TaskResponse::from(&task),
            mentions: mentions.iter().map(MentionResponse::from).collect(),
        }),
    ))
}

/// Audit trail for a task, oldest first
///
/// GET /api/tasks/:id/changelog
pub async fn task_changelog(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChangelogResponse>>, ApiError> {
    let repo = SqliteTaskRepository::new(pool);

    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("task {}", id)))?;

    let entries = repo.changelog_for(id).await?;

    Ok(Json(entries.iter().map(ChangelogResponse::from).collect()))
}

/// Delete a task (manager only)
///
/// DELETE /api/tasks/:id?agent_id=
///
/// Releases any lock and removes the dependent changelog and mention
/// rows in the same unit of work.
pub async fn delete_task(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActingAgentQuery>,
) -> Result<StatusCode, ApiError> {
    let acting = parse_agent_id(&query.agent_id)?;
    require_manager(&pool, &acting).await?;

    let repo = SqliteTaskRepository::new(pool);
    repo.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Request body for the stale-lock sweep
#[derive(Debug, Deserialize)]
pub struct ReclaimRequest {
    pub max_age_hours: i64,
}

/// Response from the stale-lock sweep
#[derive(Debug, Serialize)]
pub struct ReclaimResponse {
    pub reclaimed: Vec<TaskResponse>,
}

/// Reclaim locks older than the given age (manager only)
///
/// POST /api/tasks/reclaim?agent_id=
pub async fn reclaim_locks(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Query(query): Query<ActingAgentQuery>,
    Json(req): Json<ReclaimRequest>,
) -> Result<Json<ReclaimResponse>, ApiError> {
    let acting = parse_agent_id(&query.agent_id)?;
    if req.max_age_hours < 0 {
        return Err(ApiError::bad_request("max_age_hours cannot be negative"));
    }

    let locks = LockManager::new(pool);
    let reclaimed = locks
        .reclaim_stale(&acting, Duration::hours(req.max_age_hours))
        .await?;

    Ok(Json(ReclaimResponse {
        reclaimed: reclaimed.iter().map(TaskResponse::from).collect(),
    }))
}
