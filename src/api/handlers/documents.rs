use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::mentions::MentionResponse;
use super::parse_agent_id;
use crate::api::errors::ApiError;
use crate::api::middleware::ApiKeyAuth;
use crate::coordination::MentionScanner;
use crate::domain::document::{DocType, Document, SourceType};
use crate::domain::repositories::{AgentRepository, DocumentRepository, ProjectRepository};
use crate::infrastructure::repositories::{
    SqliteAgentRepository, SqliteDocumentRepository, SqliteProjectRepository,
};

#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub author_id: String,
}

/// Request body for creating a document
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub project_id: Option<Uuid>,
    pub doc_type: String,
    pub title: String,
    pub content: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Document representation returned by the API
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub doc_type: DocType,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Document> for DocumentResponse {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id,
            project_id: document.project_id,
            doc_type: document.doc_type,
            author_id: document.author_id.to_string(),
            title: document.title.clone(),
            content: document.content.clone(),
            created_at: document.created_at,
            expires_at: document.expires_at,
        }
    }
}

/// Response from document creation, including the mentions recorded
/// from its content
#[derive(Debug, Serialize)]
pub struct CreateDocumentResponse {
    pub document: DocumentResponse,
    pub mentions: Vec<MentionResponse>,
}

/// Create a document and scan its content for mentions
///
/// POST /api/documents?author_id=
///
/// Documents are immutable after creation; there is no edit path.
pub async fn create_document(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Query(query): Query<AuthorQuery>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<CreateDocumentResponse>), ApiError> {
    let author_id = parse_agent_id(&query.author_id)?;
    let doc_type: DocType = req.doc_type.parse().map_err(ApiError::bad_request)?;

    let agent_repo = SqliteAgentRepository::new(pool.clone());
    agent_repo
        .find_by_id(&author_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("agent {}", author_id)))?;

    if let Some(project_id) = req.project_id {
        let project_repo = SqliteProjectRepository::new(pool.clone());
        project_repo
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("project {}", project_id)))?;
    }

    let document = Document::new(
        req.project_id,
        doc_type,
        author_id.clone(),
        req.title,
        req.content,
        req.expires_at,
    )
    .map_err(ApiError::bad_request)?;

    let doc_repo = SqliteDocumentRepository::new(pool.clone());
    doc_repo.create(&document).await?;

    let scanner = MentionScanner::new(pool);
    let mentions = scanner
        .scan_and_record(
            SourceType::Document,
            document.id,
            &author_id,
            &document.content,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateDocumentResponse {
            document: DocumentResponse::from(&document),
            mentions: mentions.iter().map(MentionResponse::from).collect(),
        }),
    ))
}

/// Get a document by ID
///
/// GET /api/documents/:id
pub async fn get_document(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let repo = SqliteDocumentRepository::new(pool);
    let document = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("document {}", id)))?;

    Ok(Json(DocumentResponse::from(&document)))
}

/// List a project's documents, newest first
///
/// GET /api/projects/:id/documents
pub async fn list_project_documents(
    _auth: ApiKeyAuth,
    State(pool): State<SqlitePool>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    let project_repo = SqliteProjectRepository::new(pool.clone());
    project_repo
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("project {}", project_id)))?;

    let repo = SqliteDocumentRepository::new(pool);
    let documents = repo.list_by_project(project_id).await?;

    Ok(Json(documents.iter().map(DocumentResponse::from).collect()))
}
