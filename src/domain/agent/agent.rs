use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::value_objects::{AgentId, AgentRole, AgentStatus, ConnectionType, SkillLevel};

/// Registered agent identity
///
/// An agent is any worker, human or automated, that takes tasks through
/// the router. Registration is an upsert: re-registering an existing
/// handle refreshes the metadata rather than failing.
#[derive(Debug, Clone)]
pub struct Agent {
    pub agent_id: AgentId,
    pub role: AgentRole,
    pub skill_level: SkillLevel,
    pub status: AgentStatus,
    pub current_task_id: Option<Uuid>,
    pub connection_type: ConnectionType,
    pub last_activity: DateTime<Utc>,
    pub registered_at: DateTime<Utc>,
}

impl Agent {
    /// Creates a fresh registration record for an agent handle
    pub fn register(
        agent_id: AgentId,
        role: AgentRole,
        skill_level: SkillLevel,
        connection_type: ConnectionType,
    ) -> Self {
        let now = Utc::now();
        Self {
            agent_id,
            role,
            skill_level,
            status: AgentStatus::Idle,
            current_task_id: None,
            connection_type,
            last_activity: now,
            registered_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_starts_idle() {
        let agent = Agent::register(
            AgentId::new("backend_001").unwrap(),
            AgentRole::BackendDev,
            SkillLevel::Senior,
            ConnectionType::Automated,
        );

        assert_eq!(agent.status, AgentStatus::Idle);
        assert!(agent.current_task_id.is_none());
        assert_eq!(agent.last_activity, agent.registered_at);
    }
}
