use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_agent_id, require_manager};
use crate::api::errors::ApiError;
use crate::api::middleware::ApiKeyAuth;
use crate::domain::project::{Epic, Feature, Project};
use crate::domain::repositories::ProjectRepository;
use crate::infrastructure::repositories::SqliteProjectRepository;

/// Request body for creating a project
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Create a new project
///
/// POST /api/projects
pub async fn create_project(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = Project::new(req.name, req.description).map_err(ApiError::bad_request)?;

    let repo = SqliteProjectRepository::new(pool);
    repo.create(&project).await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// List all projects
///
/// GET /api/projects
pub async fn list_projects(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let repo = SqliteProjectRepository::new(pool);
    Ok(Json(repo.list().await?))
}

/// Get a project by ID
///
/// GET /api/projects/:id
pub async fn get_project(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    let repo = SqliteProjectRepository::new(pool);
    let project = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("project {}", id)))?;

    Ok(Json(project))
}

#[derive(Debug, Deserialize)]
pub struct ActingAgentQuery {
    pub agent_id: String,
}

/// Delete a project and everything it owns (manager only)
///
/// DELETE /api/projects/:id?agent_id=
///
/// Destructive and irreversible: cascades to epics, features, tasks,
/// changelog rows, documents, and their mentions.
pub async fn delete_project(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActingAgentQuery>,
) -> Result<StatusCode, ApiError> {
    let acting = parse_agent_id(&query.agent_id)?;
    require_manager(&pool, &acting).await?;

    let repo = SqliteProjectRepository::new(pool);
    repo.delete_cascade(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Request body for creating an epic
#[derive(Debug, Deserialize)]
pub struct CreateEpicRequest {
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Create a new epic within a project
///
/// POST /api/epics
pub async fn create_epic(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Json(req): Json<CreateEpicRequest>,
) -> Result<(StatusCode, Json<Epic>), ApiError> {
    let repo = SqliteProjectRepository::new(pool);

    repo.find_by_id(req.project_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("project {}", req.project_id)))?;

    let epic =
        Epic::new(req.project_id, req.name, req.description).map_err(ApiError::bad_request)?;
    repo.create_epic(&epic).await?;

    Ok((StatusCode::CREATED, Json(epic)))
}

/// List the epics in a project
///
/// GET /api/projects/:id/epics
pub async fn list_epics(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Epic>>, ApiError> {
    let repo = SqliteProjectRepository::new(pool);

    repo.find_by_id(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("project {}", project_id)))?;

    Ok(Json(repo.epics_for_project(project_id).await?))
}

/// Request body for creating a feature
#[derive(Debug, Deserialize)]
pub struct CreateFeatureRequest {
    pub epic_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Create a new feature within an epic
///
/// POST /api/features
pub async fn create_feature(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Json(req): Json<CreateFeatureRequest>,
) -> Result<(StatusCode, Json<Feature>), ApiError> {
    let repo = SqliteProjectRepository::new(pool);

    repo.find_epic(req.epic_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("epic {}", req.epic_id)))?;

    let feature =
        Feature::new(req.epic_id, req.name, req.description).map_err(ApiError::bad_request)?;
    repo.create_feature(&feature).await?;

    Ok((StatusCode::CREATED, Json(feature)))
}

/// List the features in an epic
///
/// GET /api/epics/:id/features
pub async fn list_features(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(epic_id): Path<Uuid>,
) -> Result<Json<Vec<Feature>>, ApiError> {
    let repo = SqliteProjectRepository::new(pool);

    repo.find_epic(epic_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("epic {}", epic_id)))?;

    Ok(Json(repo.features_for_epic(epic_id).await?))
}
