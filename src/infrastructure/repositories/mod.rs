// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod sqlite_agent_repository;
pub mod sqlite_document_repository;
pub mod sqlite_mention_repository;
pub mod sqlite_project_repository;
pub mod sqlite_task_repository;

pub use sqlite_agent_repository::SqliteAgentRepository;
pub use sqlite_document_repository::SqliteDocumentRepository;
pub use sqlite_mention_repository::SqliteMentionRepository;
pub use sqlite_project_repository::SqliteProjectRepository;
pub use sqlite_task_repository::SqliteTaskRepository;

use crate::domain::errors::CoordinationError;

/// Wraps a row-decoding failure (corrupt enum text, malformed uuid) as a
/// database error rather than a caller-facing validation error.
pub(crate) fn decode_err(message: impl Into<String>) -> CoordinationError {
    let message: String = message.into();
    CoordinationError::Database(sqlx::Error::Decode(message.into()))
}
