use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::agent::{AgentId, AgentRole};
use crate::domain::document::Mention;
use crate::domain::errors::CoordinationResult;

/// Repository trait for Mention records
#[async_trait]
pub trait MentionRepository: Send + Sync {
    /// Inserts unless a mention already exists for the same
    /// (source_type, source_id, mentioned_agent). Returns true when a row
    /// was written, so repeated scans stay idempotent.
    async fn insert_if_new(&self, mention: &Mention) -> CoordinationResult<bool>;

    async fn find_by_id(&self, id: Uuid) -> CoordinationResult<Option<Mention>>;

    /// Idempotently flips is_read
    async fn mark_read(&self, id: Uuid) -> CoordinationResult<()>;

    /// Mentions targeting one agent, newest first
    async fn for_agent(
        &self,
        agent_id: &AgentId,
        include_read: bool,
    ) -> CoordinationResult<Vec<Mention>>;

    /// Mentions targeting any agent of a role, newest first
    async fn for_role(
        &self,
        role: AgentRole,
        include_read: bool,
    ) -> CoordinationResult<Vec<Mention>>;

    /// Mentions for one agent created strictly after `since`, regardless
    /// of read state
    async fn created_since(
        &self,
        agent_id: &AgentId,
        since: DateTime<Utc>,
    ) -> CoordinationResult<Vec<Mention>>;
}
