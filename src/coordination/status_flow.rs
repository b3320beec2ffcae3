use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::errors::{CoordinationError, CoordinationResult};
use crate::domain::repositories::{AgentRepository, TaskRepository};
use crate::domain::task::{ChangelogEntry, Task, TaskStatus};
use crate::infrastructure::repositories::{SqliteAgentRepository, SqliteTaskRepository};

/// Applies status transitions
///
/// Validation happens against a snapshot of the task; the repository
/// then re-checks the expected old status inside the conditional update,
/// so a transition that raced with another caller is rejected rather
/// than partially applied. Leaving `under_work` releases the lock in the
/// same update, and every accepted transition appends exactly one
/// changelog row in the same transaction.
pub struct TransitionEngine {
    tasks: SqliteTaskRepository,
    agents: SqliteAgentRepository,
}

impl TransitionEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            tasks: SqliteTaskRepository::new(pool.clone()),
            agents: SqliteAgentRepository::new(pool),
        }
    }

    pub async fn transition(
        &self,
        task_id: Uuid,
        agent_id: &AgentId,
        to: TaskStatus,
        notes: Option<String>,
    ) -> CoordinationResult<Task> {
        let agent = self
            .agents
            .find_by_id(agent_id)
            .await?
            .ok_or_else(|| CoordinationError::NotFound(format!("agent {}", agent_id)))?;

        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| CoordinationError::NotFound(format!("task {}", task_id)))?;

        task.validate_transition(to, &agent)?;

        let entry = ChangelogEntry::record(
            task_id,
            Some(task.status()),
            to,
            agent_id.clone(),
            notes,
        );

        match self.tasks.apply_transition(&entry).await? {
            Some(updated) => {
                tracing::info!(
                    task_id = %task_id,
                    agent_id = %agent_id,
                    from = %task.status(),
                    to = %to,
                    "task transitioned"
                );
                Ok(updated)
            }
            None => Err(CoordinationError::LockConflict(format!(
                "task {} moved concurrently; status is no longer {}",
                task_id,
                task.status()
            ))),
        }
    }
}
