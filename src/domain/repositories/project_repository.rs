use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::CoordinationResult;
use crate::domain::project::{Epic, Feature, Project};

/// Repository trait for the project / epic / feature hierarchy
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: &Project) -> CoordinationResult<()>;

    async fn find_by_id(&self, id: Uuid) -> CoordinationResult<Option<Project>>;

    async fn list(&self) -> CoordinationResult<Vec<Project>>;

    /// Deletes a project and everything it owns: epics, features, tasks,
    /// changelog rows, documents, and the mentions sourced from any of
    /// them. One transaction; fails with NotFound for unknown ids.
    async fn delete_cascade(&self, id: Uuid) -> CoordinationResult<()>;

    async fn create_epic(&self, epic: &Epic) -> CoordinationResult<()>;

    async fn find_epic(&self, id: Uuid) -> CoordinationResult<Option<Epic>>;

    async fn epics_for_project(&self, project_id: Uuid) -> CoordinationResult<Vec<Epic>>;

    async fn create_feature(&self, feature: &Feature) -> CoordinationResult<()>;

    async fn find_feature(&self, id: Uuid) -> CoordinationResult<Option<Feature>>;

    async fn features_for_epic(&self, epic_id: Uuid) -> CoordinationResult<Vec<Feature>>;
}
