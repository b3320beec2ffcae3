use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::agent::{AgentId, AgentRole, SkillLevel};
use crate::domain::errors::CoordinationResult;
use crate::domain::task::{ChangelogEntry, Task};

/// Repository trait for the Task aggregate and its changelog
///
/// The lock and transition methods are the concurrency hotspot of the
/// whole engine: implementations must use single conditional updates,
/// never read-check-write, so that under concurrent requests exactly one
/// caller observes success.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task together with its initial changelog row in one
    /// unit of work
    async fn create(&self, task: &Task, initial: &ChangelogEntry) -> CoordinationResult<()>;

    async fn find_by_id(&self, id: Uuid) -> CoordinationResult<Option<Task>>;

    async fn list_by_feature(&self, feature_id: Uuid) -> CoordinationResult<Vec<Task>>;

    /// Oldest `created`, unlocked task matching the role whose difficulty
    /// is within `difficulties`, optionally scoped to one project
    async fn next_eligible(
        &self,
        role: AgentRole,
        difficulties: &[SkillLevel],
        project_id: Option<Uuid>,
    ) -> CoordinationResult<Option<Task>>;

    /// Conditional lock acquisition: sets `locked_by`/`locked_at` only if
    /// no lock is currently held. Returns true when this call took the
    /// lock, false when the guard matched no row.
    async fn try_lock(
        &self,
        task_id: Uuid,
        agent_id: &AgentId,
        at: DateTime<Utc>,
    ) -> CoordinationResult<bool>;

    /// Applies a validated transition atomically: status update guarded on
    /// the expected old status, lock release/retention, the changelog
    /// append, and the acting agent's bookkeeping, all in one transaction.
    /// Returns the updated task, or None when the guard matched no row
    /// (the task moved concurrently).
    async fn apply_transition(&self, entry: &ChangelogEntry) -> CoordinationResult<Option<Task>>;

    /// Administrative sweep of locks older than `cutoff`. Locked `created`
    /// tasks are unlocked in place; locked `under_work` tasks are reset to
    /// `created` with a changelog row. Returns the affected tasks.
    async fn reclaim_stale(
        &self,
        cutoff: DateTime<Utc>,
        reclaimed_by: &AgentId,
    ) -> CoordinationResult<Vec<Task>>;

    /// Appends a stamped line to the task's notes and bumps `updated_at`
    /// so pollers observe the change. Returns the updated task.
    async fn append_note(
        &self,
        task_id: Uuid,
        line: &str,
        at: DateTime<Utc>,
    ) -> CoordinationResult<Option<Task>>;

    /// Tasks whose `updated_at` is strictly after `since`, optionally
    /// scoped to one project
    async fn changed_since(
        &self,
        since: DateTime<Utc>,
        project_id: Option<Uuid>,
    ) -> CoordinationResult<Vec<Task>>;

    /// Audit trail for one task, oldest first
    async fn changelog_for(&self, task_id: Uuid) -> CoordinationResult<Vec<ChangelogEntry>>;

    /// Administrative delete: releases any lock, removes dependent
    /// changelog rows and task-sourced mentions, and resets the locking
    /// agent's bookkeeping. Fails with NotFound for unknown ids.
    async fn delete(&self, id: Uuid) -> CoordinationResult<()>;
}
