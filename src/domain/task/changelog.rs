use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::value_objects::TaskStatus;
use crate::domain::agent::AgentId;

/// Append-only audit row for a task status transition
///
/// Exactly one entry exists per accepted transition, written in the same
/// unit of work as the status change itself. The initial `created` entry
/// has no old status.
#[derive(Debug, Clone, Serialize)]
pub struct ChangelogEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub old_status: Option<TaskStatus>,
    pub new_status: TaskStatus,
    pub changed_by: AgentId,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

impl ChangelogEntry {
    /// Records a transition at the current instant
    pub fn record(
        task_id: Uuid,
        old_status: Option<TaskStatus>,
        new_status: TaskStatus,
        changed_by: AgentId,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            old_status,
            new_status,
            changed_by,
            notes,
            changed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_stamps_the_transition() {
        let task_id = Uuid::new_v4();
        let by = AgentId::new("qa_001").unwrap();

        let entry = ChangelogEntry::record(
            task_id,
            Some(TaskStatus::DevDone),
            TaskStatus::QaDone,
            by.clone(),
            Some("looks good".to_string()),
        );

        assert_eq!(entry.task_id, task_id);
        assert_eq!(entry.old_status, Some(TaskStatus::DevDone));
        assert_eq!(entry.new_status, TaskStatus::QaDone);
        assert_eq!(entry.changed_by, by);
        assert_eq!(entry.notes.as_deref(), Some("looks good"));
    }
}
