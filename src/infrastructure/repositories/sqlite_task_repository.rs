use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::decode_err;
use crate::domain::agent::{AgentId, AgentRole, SkillLevel};
use crate::domain::errors::{CoordinationError, CoordinationResult};
use crate::domain::repositories::TaskRepository;
use crate::domain::task::{ChangelogEntry, Task, TaskStatus};

/// SQLite implementation of TaskRepository
///
/// Lock acquisition and status transitions are single conditional
/// updates: the WHERE clause carries the expected prior state, so under
/// concurrent requests exactly one caller sees `rows_affected == 1` and
/// everyone else observes a conflict. Transitions, their changelog row,
/// and the acting agent's bookkeeping share one transaction.
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) fn map_task_row(row: &SqliteRow) -> CoordinationResult<Task> {
    let id: String = row.try_get("id")?;
    let feature_id: String = row.try_get("feature_id")?;
    let title: String = row.try_get("title")?;
    let description: Option<String> = row.try_get("description")?;
    let target_role: String = row.try_get("target_role")?;
    let difficulty: String = row.try_get("difficulty")?;
    let complexity: String = row.try_get("complexity")?;
    let branch_name: Option<String> = row.try_get("branch_name")?;
    let status: String = row.try_get("status")?;
    let locked_by: Option<String> = row.try_get("locked_by")?;
    let locked_at: Option<DateTime<Utc>> = row.try_get("locked_at")?;
    let notes: Option<String> = row.try_get("notes")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Task::from_persistence(
        Uuid::parse_str(&id).map_err(|e| decode_err(e.to_string()))?,
        Uuid::parse_str(&feature_id).map_err(|e| decode_err(e.to_string()))?,
        title,
        description,
        target_role.parse().map_err(decode_err)?,
        difficulty.parse().map_err(decode_err)?,
        complexity.parse().map_err(decode_err)?,
        branch_name,
        status.parse().map_err(decode_err)?,
        locked_by.map(AgentId::new).transpose().map_err(decode_err)?,
        locked_at,
        notes,
        created_at,
        updated_at,
    ))
}

fn map_changelog_row(row: &SqliteRow) -> CoordinationResult<ChangelogEntry> {
    let id: String = row.try_get("id")?;
    let task_id: String = row.try_get("task_id")?;
    let old_status: Option<String> = row.try_get("old_status")?;
    let new_status: String = row.try_get("new_status")?;
    let changed_by: String = row.try_get("changed_by")?;
    let notes: Option<String> = row.try_get("notes")?;
    let changed_at: DateTime<Utc> = row.try_get("changed_at")?;

    Ok(ChangelogEntry {
        id: Uuid::parse_str(&id).map_err(|e| decode_err(e.to_string()))?,
        task_id: Uuid::parse_str(&task_id).map_err(|e| decode_err(e.to_string()))?,
        old_status: old_status
            .map(|s| s.parse::<TaskStatus>())
            .transpose()
            .map_err(decode_err)?,
        new_status: new_status.parse().map_err(decode_err)?,
        changed_by: AgentId::new(changed_by).map_err(decode_err)?,
        notes,
        changed_at,
    })
}

async fn insert_changelog(
    conn: &mut SqliteConnection,
    entry: &ChangelogEntry,
) -> CoordinationResult<()> {
    sqlx::query(
        r#"
        INSERT INTO changelog (id, task_id, old_status, new_status, changed_by, notes, changed_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(entry.id.to_string())
    .bind(entry.task_id.to_string())
    .bind(entry.old_status.map(|s| s.as_str()))
    .bind(entry.new_status.as_str())
    .bind(entry.changed_by.as_str())
    .bind(&entry.notes)
    .bind(entry.changed_at)
    .execute(conn)
    .await?;

    Ok(())
}

async fn fetch_task(
    conn: &mut SqliteConnection,
    task_id: Uuid,
) -> CoordinationResult<Option<Task>> {
    let row = sqlx::query("SELECT * FROM tasks WHERE id = ?1")
        .bind(task_id.to_string())
        .fetch_optional(conn)
        .await?;

    row.as_ref().map(map_task_row).transpose()
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, task: &Task, initial: &ChangelogEntry) -> CoordinationResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, feature_id, title, description, target_role, difficulty,
                complexity, branch_name, status, locked_by, locked_at, notes,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(task.id().to_string())
        .bind(task.feature_id().to_string())
        .bind(task.title())
        .bind(task.description())
        .bind(task.target_role().as_str())
        .bind(task.difficulty().as_str())
        .bind(task.complexity().as_str())
        .bind(task.branch_name())
        .bind(task.status().as_str())
        .bind(task.locked_by().map(|a| a.as_str()))
        .bind(task.locked_at())
        .bind(task.notes())
        .bind(task.created_at())
        .bind(task.updated_at())
        .execute(&mut *tx)
        .await?;

        insert_changelog(&mut tx, initial).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> CoordinationResult<Option<Task>> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_task_row).transpose()
    }

    async fn list_by_feature(&self, feature_id: Uuid) -> CoordinationResult<Vec<Task>> {
        let rows = sqlx::query("SELECT * FROM tasks WHERE feature_id = ?1 ORDER BY created_at ASC")
            .bind(feature_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_task_row).collect()
    }

    async fn next_eligible(
        &self,
        role: AgentRole,
        difficulties: &[SkillLevel],
        project_id: Option<Uuid>,
    ) -> CoordinationResult<Option<Task>> {
        // The difficulty list comes from the closed skill ladder, never
        // from caller input, so it can be inlined.
        let difficulty_list = difficulties
            .iter()
            .map(|d| format!("'{}'", d.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            r#"
            SELECT t.* FROM tasks t
            JOIN features f ON t.feature_id = f.id
            JOIN epics e ON f.epic_id = e.id
            WHERE t.status = 'created'
              AND t.locked_by IS NULL
              AND t.target_role = ?1
              AND t.difficulty IN ({difficulty_list})
            "#
        );
        if project_id.is_some() {
            sql.push_str(" AND e.project_id = ?2");
        }
        sql.push_str(" ORDER BY t.created_at ASC LIMIT 1");

        let mut query = sqlx::query(&sql).bind(role.as_str());
        if let Some(project_id) = project_id {
            query = query.bind(project_id.to_string());
        }

        let row = query.fetch_optional(&self.pool).await?;
        row.as_ref().map(map_task_row).transpose()
    }

    async fn try_lock(
        &self,
        task_id: Uuid,
        agent_id: &AgentId,
        at: DateTime<Utc>,
    ) -> CoordinationResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tasks SET locked_by = ?1, locked_at = ?2, updated_at = ?2
            WHERE id = ?3 AND locked_by IS NULL
            "#,
        )
        .bind(agent_id.as_str())
        .bind(at)
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn apply_transition(&self, entry: &ChangelogEntry) -> CoordinationResult<Option<Task>> {
        let from = entry.old_status.ok_or_else(|| {
            CoordinationError::Validation("transition entry is missing its old status".to_string())
        })?;
        let to = entry.new_status;

        let mut tx = self.pool.begin().await?;

        // Guard on the expected old status; entering under_work also
        // re-checks the lock holder inside the same atomic statement.
        let affected = if Task::lock_survives(to) {
            sqlx::query(
                r#"
                UPDATE tasks SET status = ?1, updated_at = ?2
                WHERE id = ?3 AND status = ?4 AND locked_by = ?5
                "#,
            )
            .bind(to.as_str())
            .bind(entry.changed_at)
            .bind(entry.task_id.to_string())
            .bind(from.as_str())
            .bind(entry.changed_by.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected()
        } else {
            sqlx::query(
                r#"
                UPDATE tasks SET status = ?1, locked_by = NULL, locked_at = NULL, updated_at = ?2
                WHERE id = ?3 AND status = ?4
                "#,
            )
            .bind(to.as_str())
            .bind(entry.changed_at)
            .bind(entry.task_id.to_string())
            .bind(from.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected()
        };

        if affected == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        insert_changelog(&mut tx, entry).await?;

        if to == TaskStatus::UnderWork {
            sqlx::query(
                r#"
                UPDATE agents SET status = 'working', current_task_id = ?1, last_activity = ?2
                WHERE agent_id = ?3
                "#,
            )
            .bind(entry.task_id.to_string())
            .bind(entry.changed_at)
            .bind(entry.changed_by.as_str())
            .execute(&mut *tx)
            .await?;
        } else if from == TaskStatus::UnderWork {
            sqlx::query(
                r#"
                UPDATE agents SET status = 'idle', current_task_id = NULL, last_activity = ?1
                WHERE agent_id = ?2
                "#,
            )
            .bind(entry.changed_at)
            .bind(entry.changed_by.as_str())
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query("UPDATE agents SET last_activity = ?1 WHERE agent_id = ?2")
                .bind(entry.changed_at)
                .bind(entry.changed_by.as_str())
                .execute(&mut *tx)
                .await?;
        }

        let task = fetch_task(&mut tx, entry.task_id).await?;
        tx.commit().await?;

        Ok(task)
    }

    async fn reclaim_stale(
        &self,
        cutoff: DateTime<Utc>,
        reclaimed_by: &AgentId,
    ) -> CoordinationResult<Vec<Task>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE locked_by IS NOT NULL AND locked_at < ?1",
        )
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await?;

        let stale: Vec<Task> = rows
            .iter()
            .map(map_task_row)
            .collect::<CoordinationResult<_>>()?;

        let mut reclaimed = Vec::new();
        for task in stale {
            match task.status() {
                TaskStatus::Created => {
                    sqlx::query(
                        r#"
                        UPDATE tasks SET locked_by = NULL, locked_at = NULL, updated_at = ?1
                        WHERE id = ?2
                        "#,
                    )
                    .bind(now)
                    .bind(task.id().to_string())
                    .execute(&mut *tx)
                    .await?;
                }
                TaskStatus::UnderWork => {
                    sqlx::query(
                        r#"
                        UPDATE tasks
                        SET status = 'created', locked_by = NULL, locked_at = NULL, updated_at = ?1
                        WHERE id = ?2 AND status = 'under_work'
                        "#,
                    )
                    .bind(now)
                    .bind(task.id().to_string())
                    .execute(&mut *tx)
                    .await?;

                    let entry = ChangelogEntry::record(
                        task.id(),
                        Some(TaskStatus::UnderWork),
                        TaskStatus::Created,
                        reclaimed_by.clone(),
                        Some("stale lock reclaimed".to_string()),
                    );
                    insert_changelog(&mut tx, &entry).await?;

                    if let Some(holder) = task.locked_by() {
                        sqlx::query(
                            r#"
                            UPDATE agents SET status = 'idle', current_task_id = NULL
                            WHERE agent_id = ?1
                            "#,
                        )
                        .bind(holder.as_str())
                        .execute(&mut *tx)
                        .await?;
                    }
                }
                // A lock outside created/under_work would violate the
                // engine's own invariants; leave it for inspection.
                _ => continue,
            }

            if let Some(updated) = fetch_task(&mut tx, task.id()).await? {
                reclaimed.push(updated);
            }
        }

        tx.commit().await?;

        if !reclaimed.is_empty() {
            tracing::warn!(count = reclaimed.len(), "reclaimed stale task locks");
        }

        Ok(reclaimed)
    }

    async fn append_note(
        &self,
        task_id: Uuid,
        line: &str,
        at: DateTime<Utc>,
    ) -> CoordinationResult<Option<Task>> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET notes = CASE
                    WHEN notes IS NULL OR notes = '' THEN ?1
                    ELSE notes || char(10) || ?1
                END,
                updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(line)
        .bind(at)
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(task_id).await
    }

    async fn changed_since(
        &self,
        since: DateTime<Utc>,
        project_id: Option<Uuid>,
    ) -> CoordinationResult<Vec<Task>> {
        let rows = match project_id {
            Some(project_id) => {
                sqlx::query(
                    r#"
                    SELECT t.* FROM tasks t
                    JOIN features f ON t.feature_id = f.id
                    JOIN epics e ON f.epic_id = e.id
                    WHERE t.updated_at > ?1 AND e.project_id = ?2
                    ORDER BY t.updated_at ASC
                    "#,
                )
                .bind(since)
                .bind(project_id.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT * FROM tasks WHERE updated_at > ?1 ORDER BY updated_at ASC",
                )
                .bind(since)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(map_task_row).collect()
    }

    async fn changelog_for(&self, task_id: Uuid) -> CoordinationResult<Vec<ChangelogEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM changelog WHERE task_id = ?1 ORDER BY changed_at ASC, rowid ASC",
        )
        .bind(task_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_changelog_row).collect()
    }

    async fn delete(&self, id: Uuid) -> CoordinationResult<()> {
        let mut tx = self.pool.begin().await?;
        let task_id = id.to_string();

        sqlx::query("DELETE FROM mentions WHERE source_type = 'task' AND source_id = ?1")
            .bind(&task_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE agents SET status = 'idle', current_task_id = NULL WHERE current_task_id = ?1",
        )
        .bind(&task_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(&task_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CoordinationError::NotFound(format!("task {}", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
