use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::document::Document;
use crate::domain::errors::CoordinationResult;

/// Repository trait for Document records
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: &Document) -> CoordinationResult<()>;

    async fn find_by_id(&self, id: Uuid) -> CoordinationResult<Option<Document>>;

    async fn list_by_project(&self, project_id: Uuid) -> CoordinationResult<Vec<Document>>;
}
