use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::decode_err;
use crate::domain::agent::{AgentId, AgentRole};
use crate::domain::document::Mention;
use crate::domain::errors::CoordinationResult;
use crate::domain::repositories::MentionRepository;

/// SQLite implementation of MentionRepository
///
/// Dedup rides on the UNIQUE (source_type, source_id, mentioned_agent_id)
/// constraint: `INSERT OR IGNORE` makes repeated scans idempotent.
pub struct SqliteMentionRepository {
    pool: SqlitePool,
}

impl SqliteMentionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_mention_row(row: &SqliteRow) -> CoordinationResult<Mention> {
    let id: String = row.try_get("id")?;
    let mentioned_agent_id: String = row.try_get("mentioned_agent_id")?;
    let source_type: String = row.try_get("source_type")?;
    let source_id: String = row.try_get("source_id")?;
    let created_by: String = row.try_get("created_by")?;
    let is_read: bool = row.try_get("is_read")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Mention {
        id: Uuid::parse_str(&id).map_err(|e| decode_err(e.to_string()))?,
        mentioned_agent_id: AgentId::new(mentioned_agent_id).map_err(decode_err)?,
        source_type: source_type.parse().map_err(decode_err)?,
        source_id: Uuid::parse_str(&source_id).map_err(|e| decode_err(e.to_string()))?,
        created_by: AgentId::new(created_by).map_err(decode_err)?,
        is_read,
        created_at,
    })
}

#[async_trait]
impl MentionRepository for SqliteMentionRepository {
    async fn insert_if_new(&self, mention: &Mention) -> CoordinationResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO mentions (
                id, mentioned_agent_id, source_type, source_id, created_by,
                is_read, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(mention.id.to_string())
        .bind(mention.mentioned_agent_id.as_str())
        .bind(mention.source_type.as_str())
        .bind(mention.source_id.to_string())
        .bind(mention.created_by.as_str())
        .bind(mention.is_read)
        .bind(mention.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, id: Uuid) -> CoordinationResult<Option<Mention>> {
        let row = sqlx::query("SELECT * FROM mentions WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_mention_row).transpose()
    }

    async fn mark_read(&self, id: Uuid) -> CoordinationResult<()> {
        sqlx::query("UPDATE mentions SET is_read = 1 WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn for_agent(
        &self,
        agent_id: &AgentId,
        include_read: bool,
    ) -> CoordinationResult<Vec<Mention>> {
        let rows = if include_read {
            sqlx::query(
                "SELECT * FROM mentions WHERE mentioned_agent_id = ?1 ORDER BY created_at DESC",
            )
            .bind(agent_id.as_str())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                SELECT * FROM mentions
                WHERE mentioned_agent_id = ?1 AND is_read = 0
                ORDER BY created_at DESC
                "#,
            )
            .bind(agent_id.as_str())
            .fetch_all(&self.pool)
            .await?
        };

        rows.iter().map(map_mention_row).collect()
    }

    async fn for_role(
        &self,
        role: AgentRole,
        include_read: bool,
    ) -> CoordinationResult<Vec<Mention>> {
        let rows = if include_read {
            sqlx::query(
                r#"
                SELECT m.* FROM mentions m
                JOIN agents a ON m.mentioned_agent_id = a.agent_id
                WHERE a.role = ?1
                ORDER BY m.created_at DESC
                "#,
            )
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                SELECT m.* FROM mentions m
                JOIN agents a ON m.mentioned_agent_id = a.agent_id
                WHERE a.role = ?1 AND m.is_read = 0
                ORDER BY m.created_at DESC
                "#,
            )
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?
        };

        rows.iter().map(map_mention_row).collect()
    }

    async fn created_since(
        &self,
        agent_id: &AgentId,
        since: DateTime<Utc>,
    ) -> CoordinationResult<Vec<Mention>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM mentions
            WHERE mentioned_agent_id = ?1 AND created_at > ?2
            ORDER BY created_at DESC
            "#,
        )
        .bind(agent_id.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_mention_row).collect()
    }
}
