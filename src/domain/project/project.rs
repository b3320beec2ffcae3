use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Isolation boundary for a body of work
///
/// A project owns its epics, documents, and (transitively) features and
/// tasks. Deleting a project cascades to everything it owns; the delete
/// is destructive and irreversible.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: String, description: Option<String>) -> Result<Self, String> {
        if name.trim().is_empty() {
            return Err("Project name cannot be empty".to_string());
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description,
            created_at: Utc::now(),
        })
    }
}

/// Named grouping of features within a project
#[derive(Debug, Clone, Serialize)]
pub struct Epic {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Epic {
    pub fn new(project_id: Uuid, name: String, description: Option<String>) -> Result<Self, String> {
        if name.trim().is_empty() {
            return Err("Epic name cannot be empty".to_string());
        }
        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            name,
            description,
            created_at: Utc::now(),
        })
    }
}

/// Named grouping of tasks within an epic
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    pub id: Uuid,
    pub epic_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Feature {
    pub fn new(epic_id: Uuid, name: String, description: Option<String>) -> Result<Self, String> {
        if name.trim().is_empty() {
            return Err("Feature name cannot be empty".to_string());
        }
        Ok(Self {
            id: Uuid::new_v4(),
            epic_id,
            name,
            description,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_requires_a_name() {
        assert!(Project::new("".to_string(), None).is_err());
        assert!(Project::new("Payments".to_string(), None).is_ok());
    }

    #[test]
    fn epic_belongs_to_exactly_one_project() {
        let project = Project::new("Payments".to_string(), None).unwrap();
        let epic = Epic::new(project.id, "Checkout".to_string(), None).unwrap();
        assert_eq!(epic.project_id, project.id);
    }

    #[test]
    fn feature_belongs_to_exactly_one_epic() {
        let epic_id = Uuid::new_v4();
        let feature = Feature::new(epic_id, "Card entry".to_string(), None).unwrap();
        assert_eq!(feature.epic_id, epic_id);
    }

    #[test]
    fn blank_names_rejected() {
        assert!(Epic::new(Uuid::new_v4(), "  ".to_string(), None).is_err());
        assert!(Feature::new(Uuid::new_v4(), "\t".to_string(), None).is_err());
    }
}
