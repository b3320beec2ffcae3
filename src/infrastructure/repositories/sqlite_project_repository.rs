use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::decode_err;
use crate::domain::errors::{CoordinationError, CoordinationResult};
use crate::domain::project::{Epic, Feature, Project};
use crate::domain::repositories::ProjectRepository;

/// SQLite implementation of ProjectRepository
///
/// The project / epic / feature hierarchy is enforced with cascading
/// foreign keys; `delete_cascade` only has to clean up the polymorphic
/// mention rows the constraints cannot reach.
pub struct SqliteProjectRepository {
    pool: SqlitePool,
}

impl SqliteProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_project_row(row: &SqliteRow) -> CoordinationResult<Project> {
    let id: String = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let description: Option<String> = row.try_get("description")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Project {
        id: Uuid::parse_str(&id).map_err(|e| decode_err(e.to_string()))?,
        name,
        description,
        created_at,
    })
}

fn map_epic_row(row: &SqliteRow) -> CoordinationResult<Epic> {
    let id: String = row.try_get("id")?;
    let project_id: String = row.try_get("project_id")?;
    let name: String = row.try_get("name")?;
    let description: Option<String> = row.try_get("description")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Epic {
        id: Uuid::parse_str(&id).map_err(|e| decode_err(e.to_string()))?,
        project_id: Uuid::parse_str(&project_id).map_err(|e| decode_err(e.to_string()))?,
        name,
        description,
        created_at,
    })
}

fn map_feature_row(row: &SqliteRow) -> CoordinationResult<Feature> {
    let id: String = row.try_get("id")?;
    let epic_id: String = row.try_get("epic_id")?;
    let name: String = row.try_get("name")?;
    let description: Option<String> = row.try_get("description")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Feature {
        id: Uuid::parse_str(&id).map_err(|e| decode_err(e.to_string()))?,
        epic_id: Uuid::parse_str(&epic_id).map_err(|e| decode_err(e.to_string()))?,
        name,
        description,
        created_at,
    })
}

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn create(&self, project: &Project) -> CoordinationResult<()> {
        sqlx::query(
            "INSERT INTO projects (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(project.id.to_string())
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> CoordinationResult<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_project_row).transpose()
    }

    async fn list(&self) -> CoordinationResult<Vec<Project>> {
        let rows = sqlx::query("SELECT * FROM projects ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_project_row).collect()
    }

    async fn delete_cascade(&self, id: Uuid) -> CoordinationResult<()> {
        let mut tx = self.pool.begin().await?;
        let project_id = id.to_string();

        // Mentions reference their source polymorphically, outside the
        // reach of foreign keys.
        sqlx::query(
            r#"
            DELETE FROM mentions
            WHERE (source_type = 'task' AND source_id IN (
                    SELECT t.id FROM tasks t
                    JOIN features f ON t.feature_id = f.id
                    JOIN epics e ON f.epic_id = e.id
                    WHERE e.project_id = ?1))
               OR (source_type = 'document' AND source_id IN (
                    SELECT id FROM documents WHERE project_id = ?1))
            "#,
        )
        .bind(&project_id)
        .execute(&mut *tx)
        .await?;

        // Agents working a doomed task go back to idle.
        sqlx::query(
            r#"
            UPDATE agents SET status = 'idle', current_task_id = NULL
            WHERE current_task_id IN (
                SELECT t.id FROM tasks t
                JOIN features f ON t.feature_id = f.id
                JOIN epics e ON f.epic_id = e.id
                WHERE e.project_id = ?1)
            "#,
        )
        .bind(&project_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(&project_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CoordinationError::NotFound(format!("project {}", id)));
        }

        tx.commit().await?;
        tracing::info!(project_id = %id, "project deleted with full cascade");
        Ok(())
    }

    async fn create_epic(&self, epic: &Epic) -> CoordinationResult<()> {
        sqlx::query(
            "INSERT INTO epics (id, project_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(epic.id.to_string())
        .bind(epic.project_id.to_string())
        .bind(&epic.name)
        .bind(&epic.description)
        .bind(epic.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_epic(&self, id: Uuid) -> CoordinationResult<Option<Epic>> {
        let row = sqlx::query("SELECT * FROM epics WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_epic_row).transpose()
    }

    async fn epics_for_project(&self, project_id: Uuid) -> CoordinationResult<Vec<Epic>> {
        let rows = sqlx::query("SELECT * FROM epics WHERE project_id = ?1 ORDER BY created_at ASC")
            .bind(project_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_epic_row).collect()
    }

    async fn create_feature(&self, feature: &Feature) -> CoordinationResult<()> {
        sqlx::query(
            "INSERT INTO features (id, epic_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(feature.id.to_string())
        .bind(feature.epic_id.to_string())
        .bind(&feature.name)
        .bind(&feature.description)
        .bind(feature.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_feature(&self, id: Uuid) -> CoordinationResult<Option<Feature>> {
        let row = sqlx::query("SELECT * FROM features WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_feature_row).transpose()
    }

    async fn features_for_epic(&self, epic_id: Uuid) -> CoordinationResult<Vec<Feature>> {
        let rows = sqlx::query("SELECT * FROM features WHERE epic_id = ?1 ORDER BY created_at ASC")
            .bind(epic_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_feature_row).collect()
    }
}
