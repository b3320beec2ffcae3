use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::decode_err;
use crate::domain::agent::{Agent, AgentId};
use crate::domain::errors::CoordinationResult;
use crate::domain::repositories::AgentRepository;

/// SQLite implementation of AgentRepository
pub struct SqliteAgentRepository {
    pool: SqlitePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) fn map_agent_row(row: &SqliteRow) -> CoordinationResult<Agent> {
    let agent_id: String = row.try_get("agent_id")?;
    let role: String = row.try_get("role")?;
    let skill_level: String = row.try_get("skill_level")?;
    let status: String = row.try_get("status")?;
    let current_task_id: Option<String> = row.try_get("current_task_id")?;
    let connection_type: String = row.try_get("connection_type")?;
    let last_activity: DateTime<Utc> = row.try_get("last_activity")?;
    let registered_at: DateTime<Utc> = row.try_get("registered_at")?;

    Ok(Agent {
        agent_id: AgentId::new(agent_id).map_err(decode_err)?,
        role: role.parse().map_err(decode_err)?,
        skill_level: skill_level.parse().map_err(decode_err)?,
        status: status.parse().map_err(decode_err)?,
        current_task_id: current_task_id
            .map(|id| Uuid::parse_str(&id))
            .transpose()
            .map_err(|e| decode_err(e.to_string()))?,
        connection_type: connection_type.parse().map_err(decode_err)?,
        last_activity,
        registered_at,
    })
}

#[async_trait]
impl AgentRepository for SqliteAgentRepository {
    async fn upsert(&self, agent: &Agent) -> CoordinationResult<()> {
        sqlx::query(
            r#"
            INSERT INTO agents (
                agent_id, role, skill_level, status, current_task_id,
                connection_type, last_activity, registered_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (agent_id) DO UPDATE SET
                role = excluded.role,
                skill_level = excluded.skill_level,
                connection_type = excluded.connection_type,
                last_activity = excluded.last_activity
            "#,
        )
        .bind(agent.agent_id.as_str())
        .bind(agent.role.as_str())
        .bind(agent.skill_level.as_str())
        .bind(agent.status.as_str())
        .bind(agent.current_task_id.map(|id| id.to_string()))
        .bind(agent.connection_type.as_str())
        .bind(agent.last_activity)
        .bind(agent.registered_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, agent_id: &AgentId) -> CoordinationResult<Option<Agent>> {
        let row = sqlx::query("SELECT * FROM agents WHERE agent_id = ?1")
            .bind(agent_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_agent_row).transpose()
    }

    async fn list(&self) -> CoordinationResult<Vec<Agent>> {
        let rows = sqlx::query("SELECT * FROM agents ORDER BY agent_id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_agent_row).collect()
    }

    async fn touch_activity(
        &self,
        agent_id: &AgentId,
        at: DateTime<Utc>,
    ) -> CoordinationResult<()> {
        sqlx::query("UPDATE agents SET last_activity = ?1 WHERE agent_id = ?2")
            .bind(at)
            .bind(agent_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, agent_id: &AgentId) -> CoordinationResult<()> {
        let result = sqlx::query("DELETE FROM agents WHERE agent_id = ?1")
            .bind(agent_id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(crate::domain::errors::CoordinationError::NotFound(format!(
                "agent {}",
                agent_id
            )));
        }

        Ok(())
    }
}
