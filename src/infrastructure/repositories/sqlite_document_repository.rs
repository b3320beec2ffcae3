use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::decode_err;
use crate::domain::agent::AgentId;
use crate::domain::document::Document;
use crate::domain::errors::CoordinationResult;
use crate::domain::repositories::DocumentRepository;

/// SQLite implementation of DocumentRepository
///
/// Documents are append-only; there is no update path.
pub struct SqliteDocumentRepository {
    pool: SqlitePool,
}

impl SqliteDocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_document_row(row: &SqliteRow) -> CoordinationResult<Document> {
    let id: String = row.try_get("id")?;
    let project_id: Option<String> = row.try_get("project_id")?;
    let doc_type: String = row.try_get("doc_type")?;
    let author_id: String = row.try_get("author_id")?;
    let title: String = row.try_get("title")?;
    let content: String = row.try_get("content")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at")?;

    Ok(Document {
        id: Uuid::parse_str(&id).map_err(|e| decode_err(e.to_string()))?,
        project_id: project_id
            .map(|id| Uuid::parse_str(&id))
            .transpose()
            .map_err(|e| decode_err(e.to_string()))?,
        doc_type: doc_type.parse().map_err(decode_err)?,
        author_id: AgentId::new(author_id).map_err(decode_err)?,
        title,
        content,
        created_at,
        expires_at,
    })
}

#[async_trait]
impl DocumentRepository for SqliteDocumentRepository {
    async fn create(&self, document: &Document) -> CoordinationResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (
                id, project_id, doc_type, author_id, title, content,
                created_at, expires_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(document.id.to_string())
        .bind(document.project_id.map(|id| id.to_string()))
        .bind(document.doc_type.as_str())
        .bind(document.author_id.as_str())
        .bind(&document.title)
        .bind(&document.content)
        .bind(document.created_at)
        .bind(document.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> CoordinationResult<Option<Document>> {
        let row = sqlx::query("SELECT * FROM documents WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_document_row).transpose()
    }

    async fn list_by_project(&self, project_id: Uuid) -> CoordinationResult<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT * FROM documents WHERE project_id = ?1 ORDER BY created_at DESC",
        )
        .bind(project_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_document_row).collect()
    }
}
