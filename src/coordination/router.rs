use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::agent::{AgentRole, SkillLevel};
use crate::domain::errors::CoordinationResult;
use crate::domain::repositories::TaskRepository;
use crate::domain::task::Task;
use crate::infrastructure::repositories::SqliteTaskRepository;

/// Selects the next eligible task for a requesting agent
///
/// Selection is read-only: asking for a task does not commit the agent
/// to it, and two agents may be shown the same task. Correctness is
/// enforced at lock time, not at selection time.
pub struct TaskRouter {
    tasks: SqliteTaskRepository,
}

impl TaskRouter {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            tasks: SqliteTaskRepository::new(pool),
        }
    }

    /// Oldest `created`, unlocked task matching the role whose difficulty
    /// the agent's skill level covers. `None` is a legitimate empty
    /// result, not a failure.
    pub async fn next_task(
        &self,
        role: AgentRole,
        skill_level: SkillLevel,
        project_id: Option<Uuid>,
    ) -> CoordinationResult<Option<Task>> {
        self.tasks
            .next_eligible(role, skill_level.takeable_difficulties(), project_id)
            .await
    }
}
