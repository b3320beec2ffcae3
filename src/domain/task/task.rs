use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::changelog::ChangelogEntry;
use super::value_objects::{Complexity, TaskStatus};
use crate::domain::agent::{Agent, AgentId, AgentRole, SkillLevel};
use crate::domain::errors::CoordinationError;

/// Task aggregate root
///
/// The unit of work handed to agents through the router. Enforces the
/// status state machine, the role gates, and the single-owner lock
/// discipline; the storage layer is responsible for applying accepted
/// transitions atomically.
///
/// # Invariants
/// - Title cannot be empty
/// - Status changes only along the edges in [`TaskStatus::can_transition_to`]
/// - A transition into any state other than `under_work` leaves the lock
///   released
#[derive(Debug, Clone)]
pub struct Task {
    id: Uuid,
    feature_id: Uuid,
    title: String,
    description: Option<String>,
    target_role: AgentRole,
    difficulty: SkillLevel,
    complexity: Complexity,
    branch_name: Option<String>,
    status: TaskStatus,
    locked_by: Option<AgentId>,
    locked_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new Task in `created` status
    ///
    /// # Returns
    /// * `Ok((Task, ChangelogEntry))` - The task and its initial changelog
    ///   row, persisted together in one unit of work
    /// * `Err(String)` - If any invariant is violated
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feature_id: Uuid,
        title: String,
        description: Option<String>,
        target_role: AgentRole,
        difficulty: SkillLevel,
        complexity: Complexity,
        branch_name: Option<String>,
        created_by: &AgentId,
    ) -> Result<(Self, ChangelogEntry), String> {
        if title.trim().is_empty() {
            return Err("Title cannot be empty".to_string());
        }

        let now = Utc::now();
        let task = Self {
            id: Uuid::new_v4(),
            feature_id,
            title,
            description,
            target_role,
            difficulty,
            complexity,
            branch_name,
            status: TaskStatus::Created,
            locked_by: None,
            locked_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        let entry = ChangelogEntry::record(
            task.id,
            None,
            TaskStatus::Created,
            created_by.clone(),
            None,
        );

        Ok((task, entry))
    }

    /// Validates that `agent` may move this task to `to`
    ///
    /// Checks, in order: edge legality, the uniform lock gate (no
    /// transition past another agent's lock), the lock-before-work rule
    /// for `under_work`, and the QA role gates. Returns without mutating;
    /// the accepted transition is applied by the store as a conditional
    /// update so concurrent movers are detected there.
    pub fn validate_transition(
        &self,
        to: TaskStatus,
        agent: &Agent,
    ) -> Result<(), CoordinationError> {
        if !self.status.can_transition_to(to) {
            return Err(CoordinationError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        if let Some(holder) = &self.locked_by {
            if holder != &agent.agent_id {
                return Err(CoordinationError::LockConflict(format!(
                    "task {} is locked by {}",
                    self.id, holder
                )));
            }
        }

        if to == TaskStatus::UnderWork && self.locked_by.as_ref() != Some(&agent.agent_id) {
            return Err(CoordinationError::LockConflict(format!(
                "task {} must be locked before work starts",
                self.id
            )));
        }

        let needs_qa = matches!(
            (self.status, to),
            (TaskStatus::DevDone, TaskStatus::QaDone) | (TaskStatus::QaDone, TaskStatus::Created)
        );
        if needs_qa && agent.role != AgentRole::Qa {
            return Err(CoordinationError::Forbidden(format!(
                "transition {} -> {} requires the qa role",
                self.status, to
            )));
        }

        Ok(())
    }

    /// Whether a transition into `to` leaves the lock held
    ///
    /// Only `under_work` is an actively-worked state; every other target
    /// releases the lock as part of the same atomic update.
    pub fn lock_survives(to: TaskStatus) -> bool {
        to == TaskStatus::UnderWork
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn feature_id(&self) -> Uuid {
        self.feature_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn target_role(&self) -> AgentRole {
        self.target_role
    }

    pub fn difficulty(&self) -> SkillLevel {
        self.difficulty
    }

    pub fn complexity(&self) -> Complexity {
        self.complexity
    }

    pub fn branch_name(&self) -> Option<&str> {
        self.branch_name.as_deref()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn locked_by(&self) -> Option<&AgentId> {
        self.locked_by.as_ref()
    }

    pub fn locked_at(&self) -> Option<DateTime<Utc>> {
        self.locked_at
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Task from persistence layer data
    ///
    /// Bypasses business rule validation; only to be used by repository
    /// implementations for data reconstruction.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        feature_id: Uuid,
        title: String,
        description: Option<String>,
        target_role: AgentRole,
        difficulty: SkillLevel,
        complexity: Complexity,
        branch_name: Option<String>,
        status: TaskStatus,
        locked_by: Option<AgentId>,
        locked_at: Option<DateTime<Utc>>,
        notes: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            feature_id,
            title,
            description,
            target_role,
            difficulty,
            complexity,
            branch_name,
            status,
            locked_by,
            locked_at,
            notes,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::ConnectionType;

    fn agent(id: &str, role: AgentRole) -> Agent {
        Agent::register(
            AgentId::new(id).unwrap(),
            role,
            SkillLevel::Senior,
            ConnectionType::Automated,
        )
    }

    fn task(status: TaskStatus, locked_by: Option<&str>) -> Task {
        let now = Utc::now();
        Task::from_persistence(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Implement endpoint".to_string(),
            None,
            AgentRole::BackendDev,
            SkillLevel::Senior,
            Complexity::Minor,
            None,
            status,
            locked_by.map(|id| AgentId::new(id).unwrap()),
            locked_by.map(|_| now),
            None,
            now,
            now,
        )
    }

    #[test]
    fn create_task_with_valid_title() {
        let creator = AgentId::new("backend_001").unwrap();
        let (task, entry) = Task::new(
            Uuid::new_v4(),
            "Implement endpoint".to_string(),
            Some("details".to_string()),
            AgentRole::BackendDev,
            SkillLevel::Senior,
            Complexity::Minor,
            None,
            &creator,
        )
        .unwrap();

        assert_eq!(task.status(), TaskStatus::Created);
        assert!(task.locked_by().is_none());
        assert_eq!(entry.task_id, task.id());
        assert_eq!(entry.old_status, None);
        assert_eq!(entry.new_status, TaskStatus::Created);
    }

    #[test]
    fn create_task_with_empty_title_fails() {
        let creator = AgentId::new("backend_001").unwrap();
        let result = Task::new(
            Uuid::new_v4(),
            "   ".to_string(),
            None,
            AgentRole::BackendDev,
            SkillLevel::Junior,
            Complexity::Minor,
            None,
            &creator,
        );

        assert!(result.is_err());
    }

    #[test]
    fn under_work_requires_holding_the_lock() {
        let dev = agent("backend_001", AgentRole::BackendDev);
        let unlocked = task(TaskStatus::Created, None);

        let err = unlocked
            .validate_transition(TaskStatus::UnderWork, &dev)
            .unwrap_err();
        assert!(matches!(err, CoordinationError::LockConflict(_)));

        let locked = task(TaskStatus::Created, Some("backend_001"));
        assert!(locked.validate_transition(TaskStatus::UnderWork, &dev).is_ok());
    }

    #[test]
    fn lock_holder_gate_applies_to_every_transition() {
        let other = agent("backend_002", AgentRole::BackendDev);
        let locked = task(TaskStatus::UnderWork, Some("backend_001"));

        let err = locked
            .validate_transition(TaskStatus::DevDone, &other)
            .unwrap_err();
        assert!(matches!(err, CoordinationError::LockConflict(_)));
    }

    #[test]
    fn illegal_edge_is_invalid_transition() {
        let dev = agent("backend_001", AgentRole::BackendDev);
        let created = task(TaskStatus::Created, None);

        let err = created
            .validate_transition(TaskStatus::DevDone, &dev)
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinationError::InvalidTransition {
                from: TaskStatus::Created,
                to: TaskStatus::DevDone
            }
        ));
    }

    #[test]
    fn qa_done_requires_qa_role() {
        let dev = agent("backend_001", AgentRole::BackendDev);
        let qa = agent("qa_001", AgentRole::Qa);
        let dev_done = task(TaskStatus::DevDone, None);

        let err = dev_done
            .validate_transition(TaskStatus::QaDone, &dev)
            .unwrap_err();
        assert!(matches!(err, CoordinationError::Forbidden(_)));

        assert!(dev_done.validate_transition(TaskStatus::QaDone, &qa).is_ok());
    }

    #[test]
    fn qa_rejection_requires_qa_role() {
        let docs = agent("docs_001", AgentRole::Docs);
        let qa = agent("qa_001", AgentRole::Qa);
        let qa_done = task(TaskStatus::QaDone, None);

        assert!(matches!(
            qa_done
                .validate_transition(TaskStatus::Created, &docs)
                .unwrap_err(),
            CoordinationError::Forbidden(_)
        ));
        assert!(qa_done.validate_transition(TaskStatus::Created, &qa).is_ok());
    }

    #[test]
    fn documentation_and_commit_are_open_to_any_role() {
        let docs = agent("docs_001", AgentRole::Docs);
        let qa_done = task(TaskStatus::QaDone, None);
        let doc_done = task(TaskStatus::DocumentationDone, None);

        assert!(qa_done
            .validate_transition(TaskStatus::DocumentationDone, &docs)
            .is_ok());
        assert!(doc_done
            .validate_transition(TaskStatus::Committed, &docs)
            .is_ok());
    }

    #[test]
    fn lock_survives_only_under_work() {
        assert!(Task::lock_survives(TaskStatus::UnderWork));
        assert!(!Task::lock_survives(TaskStatus::DevDone));
        assert!(!Task::lock_survives(TaskStatus::Created));
        assert!(!Task::lock_survives(TaskStatus::Committed));
    }
}
