use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::AgentId;

/// Where a mention was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Document,
    Task,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Document => "document",
            SourceType::Task => "task",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(SourceType::Document),
            "task" => Ok(SourceType::Task),
            other => Err(format!("Unknown mention source type: {}", other)),
        }
    }
}

/// Notification derived from an `@agent_id` token in free text
///
/// At most one mention exists per (source_type, source_id, mentioned
/// agent); repeated scans of the same content are idempotent. Only the
/// mentioned agent may mark it read.
#[derive(Debug, Clone)]
pub struct Mention {
    pub id: Uuid,
    pub mentioned_agent_id: AgentId,
    pub source_type: SourceType,
    pub source_id: Uuid,
    pub created_by: AgentId,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Mention {
    pub fn record(
        mentioned_agent_id: AgentId,
        source_type: SourceType,
        source_id: Uuid,
        created_by: AgentId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mentioned_agent_id,
            source_type,
            source_id,
            created_by,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_starts_unread() {
        let mention = Mention::record(
            AgentId::new("qa_001").unwrap(),
            SourceType::Document,
            Uuid::new_v4(),
            AgentId::new("backend_001").unwrap(),
        );
        assert!(!mention.is_read);
    }
}
