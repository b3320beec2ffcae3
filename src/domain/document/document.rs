use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::AgentId;

/// Kind of communication artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Announcement,
    Handoff,
    Design,
    Note,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Announcement => "announcement",
            DocType::Handoff => "handoff",
            DocType::Design => "design",
            DocType::Note => "note",
        }
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "announcement" => Ok(DocType::Announcement),
            "handoff" => Ok(DocType::Handoff),
            "design" => Ok(DocType::Design),
            "note" => Ok(DocType::Note),
            other => Err(format!("Unknown doc type: {}", other)),
        }
    }
}

/// Free-text communication artifact
///
/// Content is markdown and may embed `@agent_id` tokens, which the
/// mention engine turns into notification rows at creation time.
/// Documents are immutable once created; there is no edit path.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub doc_type: DocType,
    pub author_id: AgentId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(
        project_id: Option<Uuid>,
        doc_type: DocType,
        author_id: AgentId,
        title: String,
        content: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, String> {
        if title.trim().is_empty() {
            return Err("Document title cannot be empty".to_string());
        }
        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            doc_type,
            author_id,
            title,
            content,
            created_at: Utc::now(),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_requires_a_title() {
        let author = AgentId::new("docs_001").unwrap();
        assert!(Document::new(
            None,
            DocType::Note,
            author.clone(),
            "".to_string(),
            "body".to_string(),
            None,
        )
        .is_err());

        assert!(Document::new(
            None,
            DocType::Note,
            author,
            "Standup notes".to_string(),
            "body".to_string(),
            None,
        )
        .is_ok());
    }

    #[test]
    fn doc_type_round_trip() {
        for t in [
            DocType::Announcement,
            DocType::Handoff,
            DocType::Design,
            DocType::Note,
        ] {
            assert_eq!(t.as_str().parse::<DocType>().unwrap(), t);
        }
    }
}
