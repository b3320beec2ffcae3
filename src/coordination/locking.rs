use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::agent::{AgentId, AgentRole};
use crate::domain::errors::{CoordinationError, CoordinationResult};
use crate::domain::repositories::{AgentRepository, TaskRepository};
use crate::domain::task::Task;
use crate::infrastructure::repositories::{SqliteAgentRepository, SqliteTaskRepository};

/// Exclusive per-task claims tied to an agent identity
///
/// Acquisition is a single conditional update on `locked_by`, so exactly
/// one of any number of concurrent callers succeeds. There is no direct
/// unlock: locks are released only as part of a status transition, or by
/// the administrative stale-lock sweep.
pub struct LockManager {
    tasks: SqliteTaskRepository,
    agents: SqliteAgentRepository,
}

impl LockManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            tasks: SqliteTaskRepository::new(pool.clone()),
            agents: SqliteAgentRepository::new(pool),
        }
    }

    /// Acquires the lock for `agent_id`
    ///
    /// Idempotent when the agent already holds it; `LockConflict` when a
    /// different agent does, or when the task lost the race between the
    /// conditional update and this call's snapshot.
    pub async fn lock(&self, task_id: Uuid, agent_id: &AgentId) -> CoordinationResult<Task> {
        if self.agents.find_by_id(agent_id).await?.is_none() {
            return Err(CoordinationError::NotFound(format!("agent {}", agent_id)));
        }

        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| CoordinationError::NotFound(format!("task {}", task_id)))?;

        if task.status().is_terminal() {
            return Err(CoordinationError::LockConflict(format!(
                "task {} is committed and cannot be locked",
                task_id
            )));
        }

        if task.locked_by() == Some(agent_id) {
            return Ok(task);
        }

        let now = Utc::now();
        if self.tasks.try_lock(task_id, agent_id, now).await? {
            self.agents.touch_activity(agent_id, now).await?;
            tracing::info!(task_id = %task_id, agent_id = %agent_id, "task locked");

            return self
                .tasks
                .find_by_id(task_id)
                .await?
                .ok_or_else(|| CoordinationError::NotFound(format!("task {}", task_id)));
        }

        let holder = self
            .tasks
            .find_by_id(task_id)
            .await?
            .and_then(|t| t.locked_by().cloned());

        Err(CoordinationError::LockConflict(match holder {
            Some(holder) => format!("task {} is locked by {}", task_id, holder),
            None => format!("task {} lock changed concurrently", task_id),
        }))
    }

    /// Manager-only sweep of locks older than `max_age`
    ///
    /// Returns the tasks whose locks were reclaimed. Observable
    /// transition semantics for normal callers are unchanged; the reset
    /// of an abandoned `under_work` task is recorded in the changelog.
    pub async fn reclaim_stale(
        &self,
        requested_by: &AgentId,
        max_age: Duration,
    ) -> CoordinationResult<Vec<Task>> {
        let agent = self
            .agents
            .find_by_id(requested_by)
            .await?
            .ok_or_else(|| CoordinationError::NotFound(format!("agent {}", requested_by)))?;

        if agent.role != AgentRole::Manager {
            return Err(CoordinationError::Forbidden(
                "stale lock reclaim requires the manager role".to_string(),
            ));
        }

        let cutoff = Utc::now() - max_age;
        self.tasks.reclaim_stale(cutoff, requested_by).await
    }
}
