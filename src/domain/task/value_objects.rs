use serde::{Deserialize, Serialize};

/// Represents the lifecycle status of a task
///
/// # Status Transitions
/// ```text
/// created -> under_work -> dev_done -> qa_done -> documentation_done -> committed
///    ^                                    |
///    `------------------------------------'   (QA rejection)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task exists and is available for pickup
    Created,
    /// An agent holds the lock and is actively working
    UnderWork,
    /// Development finished, awaiting QA
    DevDone,
    /// QA approved
    QaDone,
    /// Documentation written
    DocumentationDone,
    /// Terminal state
    Committed,
}

impl TaskStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Valid Transitions
    /// - Created -> UnderWork
    /// - UnderWork -> DevDone
    /// - DevDone -> QaDone
    /// - QaDone -> DocumentationDone
    /// - QaDone -> Created (the single backward edge, QA rejection)
    /// - DocumentationDone -> Committed
    ///
    /// # Example
    /// ```
    /// use swarmdeck_api::domain::task::TaskStatus;
    ///
    /// assert!(TaskStatus::Created.can_transition_to(TaskStatus::UnderWork));
    /// assert!(!TaskStatus::Created.can_transition_to(TaskStatus::DevDone));
    /// ```
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Created, UnderWork)
                | (UnderWork, DevDone)
                | (DevDone, QaDone)
                | (QaDone, DocumentationDone)
                | (QaDone, Created)
                | (DocumentationDone, Committed)
        )
    }

    /// Terminal states accept no further transitions and cannot be locked
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Committed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Created => "created",
            TaskStatus::UnderWork => "under_work",
            TaskStatus::DevDone => "dev_done",
            TaskStatus::QaDone => "qa_done",
            TaskStatus::DocumentationDone => "documentation_done",
            TaskStatus::Committed => "committed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(TaskStatus::Created),
            "under_work" => Ok(TaskStatus::UnderWork),
            "dev_done" => Ok(TaskStatus::DevDone),
            "qa_done" => Ok(TaskStatus::QaDone),
            "documentation_done" => Ok(TaskStatus::DocumentationDone),
            "committed" => Ok(TaskStatus::Committed),
            other => Err(format!("Unknown task status: {}", other)),
        }
    }
}

/// Whether the work is expected to land as a direct commit or branch + PR
///
/// Purely a downstream signal; the engine itself does not act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Minor,
    Major,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Minor => "minor",
            Complexity::Major => "major",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minor" => Ok(Complexity::Minor),
            "major" => Ok(Complexity::Major),
            other => Err(format!("Unknown complexity: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transition_created_to_under_work() {
        assert!(TaskStatus::Created.can_transition_to(TaskStatus::UnderWork));
    }

    #[test]
    fn valid_transition_under_work_to_dev_done() {
        assert!(TaskStatus::UnderWork.can_transition_to(TaskStatus::DevDone));
    }

    #[test]
    fn valid_transition_dev_done_to_qa_done() {
        assert!(TaskStatus::DevDone.can_transition_to(TaskStatus::QaDone));
    }

    #[test]
    fn valid_transition_qa_done_to_documentation_done() {
        assert!(TaskStatus::QaDone.can_transition_to(TaskStatus::DocumentationDone));
    }

    #[test]
    fn valid_transition_documentation_done_to_committed() {
        assert!(TaskStatus::DocumentationDone.can_transition_to(TaskStatus::Committed));
    }

    #[test]
    fn qa_rejection_is_the_only_backward_edge() {
        assert!(TaskStatus::QaDone.can_transition_to(TaskStatus::Created));
        assert!(!TaskStatus::UnderWork.can_transition_to(TaskStatus::Created));
        assert!(!TaskStatus::DevDone.can_transition_to(TaskStatus::Created));
        assert!(!TaskStatus::DocumentationDone.can_transition_to(TaskStatus::Created));
    }

    #[test]
    fn invalid_transition_created_to_dev_done() {
        assert!(!TaskStatus::Created.can_transition_to(TaskStatus::DevDone));
    }

    #[test]
    fn invalid_transition_skipping_qa() {
        assert!(!TaskStatus::DevDone.can_transition_to(TaskStatus::DocumentationDone));
        assert!(!TaskStatus::DevDone.can_transition_to(TaskStatus::Committed));
    }

    #[test]
    fn committed_is_terminal() {
        assert!(TaskStatus::Committed.is_terminal());
        assert!(!TaskStatus::Committed.can_transition_to(TaskStatus::Created));
        assert!(!TaskStatus::Committed.can_transition_to(TaskStatus::UnderWork));
    }

    #[test]
    fn no_self_transitions() {
        for status in [
            TaskStatus::Created,
            TaskStatus::UnderWork,
            TaskStatus::DevDone,
            TaskStatus::QaDone,
            TaskStatus::DocumentationDone,
            TaskStatus::Committed,
        ] {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn status_display() {
        assert_eq!(TaskStatus::Created.to_string(), "created");
        assert_eq!(TaskStatus::UnderWork.to_string(), "under_work");
        assert_eq!(TaskStatus::DevDone.to_string(), "dev_done");
        assert_eq!(TaskStatus::QaDone.to_string(), "qa_done");
        assert_eq!(TaskStatus::DocumentationDone.to_string(), "documentation_done");
        assert_eq!(TaskStatus::Committed.to_string(), "committed");
    }

    #[test]
    fn status_round_trip() {
        for status in [
            TaskStatus::Created,
            TaskStatus::UnderWork,
            TaskStatus::DevDone,
            TaskStatus::QaDone,
            TaskStatus::DocumentationDone,
            TaskStatus::Committed,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }
}
