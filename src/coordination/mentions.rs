use regex::Regex;
use sqlx::SqlitePool;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::document::{Mention, SourceType};
use crate::domain::errors::{CoordinationError, CoordinationResult};
use crate::domain::repositories::{AgentRepository, MentionRepository};
use crate::infrastructure::repositories::{SqliteAgentRepository, SqliteMentionRepository};

static MENTION_PATTERN: OnceLock<Regex> = OnceLock::new();

fn mention_pattern() -> &'static Regex {
    MENTION_PATTERN.get_or_init(|| Regex::new(r"@([A-Za-z0-9_-]+)").expect("Invalid regex"))
}

/// Turns `@agent_id` tokens in free text into notification rows
///
/// Scanning is an explicit service call invoked synchronously by the
/// document and comment write paths, so it stays testable on its own.
/// Tokens that match no registered agent are not an error; free text may
/// use `@` for other purposes.
pub struct MentionScanner {
    agents: SqliteAgentRepository,
    mentions: SqliteMentionRepository,
}

impl MentionScanner {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            agents: SqliteAgentRepository::new(pool.clone()),
            mentions: SqliteMentionRepository::new(pool),
        }
    }

    /// Distinct `@` handles in order of first appearance
    pub fn extract_handles(content: &str) -> Vec<String> {
        let mut handles = Vec::new();
        for capture in mention_pattern().captures_iter(content) {
            let handle = capture[1].to_string();
            if !handles.contains(&handle) {
                handles.push(handle);
            }
        }
        handles
    }

    /// Records one mention per distinct known agent referenced in
    /// `content`. Deduplicated per (source, agent): re-scanning the same
    /// content creates nothing new.
    pub async fn scan_and_record(
        &self,
        source_type: SourceType,
        source_id: Uuid,
        created_by: &AgentId,
        content: &str,
    ) -> CoordinationResult<Vec<Mention>> {
        let mut recorded = Vec::new();

        for handle in Self::extract_handles(content) {
            let agent_id = match AgentId::new(handle.as_str()) {
                Ok(id) => id,
                Err(_) => continue,
            };

            if self.agents.find_by_id(&agent_id).await?.is_none() {
                continue;
            }

            let mention = Mention::record(agent_id, source_type, source_id, created_by.clone());
            if self.mentions.insert_if_new(&mention).await? {
                recorded.push(mention);
            }
        }

        Ok(recorded)
    }

    /// Marks a mention read on behalf of its recipient
    ///
    /// `Forbidden` for anyone but the mentioned agent; idempotent for the
    /// recipient.
    pub async fn mark_read(
        &self,
        mention_id: Uuid,
        agent_id: &AgentId,
    ) -> CoordinationResult<Mention> {
        let mention = self
            .mentions
            .find_by_id(mention_id)
            .await?
            .ok_or_else(|| CoordinationError::NotFound(format!("mention {}", mention_id)))?;

        if &mention.mentioned_agent_id != agent_id {
            return Err(CoordinationError::Forbidden(
                "only the mentioned agent can mark a mention read".to_string(),
            ));
        }

        if !mention.is_read {
            self.mentions.mark_read(mention_id).await?;
        }

        Ok(Mention {
            is_read: true,
            ..mention
        })
    }
}
