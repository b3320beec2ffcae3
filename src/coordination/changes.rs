use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::document::Mention;
use crate::domain::errors::{CoordinationError, CoordinationResult};
use crate::domain::repositories::{AgentRepository, MentionRepository, TaskRepository};
use crate::domain::task::Task;
use crate::infrastructure::repositories::{
    SqliteAgentRepository, SqliteMentionRepository, SqliteTaskRepository,
};

/// Everything that changed since a caller-supplied cursor
///
/// `timestamp` is the caller's next cursor and is opaque: it is
/// snapshotted before the queries run, so an update landing mid-query is
/// delivered again on the next poll rather than lost.
pub struct ChangeSet {
    pub tasks: Vec<Task>,
    pub mentions: Vec<Mention>,
    pub timestamp: DateTime<Utc>,
}

/// Client-driven delta feed for agents without a push channel
pub struct ChangeFeed {
    tasks: SqliteTaskRepository,
    mentions: SqliteMentionRepository,
    agents: SqliteAgentRepository,
}

impl ChangeFeed {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            tasks: SqliteTaskRepository::new(pool.clone()),
            mentions: SqliteMentionRepository::new(pool.clone()),
            agents: SqliteAgentRepository::new(pool),
        }
    }

    /// Tasks updated and mentions created strictly after `since`.
    /// Mentions are included regardless of read state; the feed reports
    /// what is new, not what is unread.
    pub async fn poll(
        &self,
        since: DateTime<Utc>,
        agent_id: &AgentId,
        project_id: Option<Uuid>,
    ) -> CoordinationResult<ChangeSet> {
        if self.agents.find_by_id(agent_id).await?.is_none() {
            return Err(CoordinationError::NotFound(format!("agent {}", agent_id)));
        }

        // Snapshot before querying, not after.
        let timestamp = Utc::now();

        let tasks = self.tasks.changed_since(since, project_id).await?;
        let mentions = self.mentions.created_since(agent_id, since).await?;

        self.agents.touch_activity(agent_id, timestamp).await?;

        Ok(ChangeSet {
            tasks,
            mentions,
            timestamp,
        })
    }
}
