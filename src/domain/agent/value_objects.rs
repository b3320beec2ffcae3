use serde::{Deserialize, Serialize};
use std::fmt;

/// AgentId value object representing a stable agent handle
///
/// # Invariants
/// - Only letters, digits, underscore, and hyphen
/// - Between 1 and 64 characters
/// - Is immutable after construction
///
/// # Example
/// ```
/// use swarmdeck_api::domain::agent::AgentId;
///
/// let id = AgentId::new("qa_001").expect("valid handle");
/// assert_eq!(id.as_str(), "qa_001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Creates a new AgentId value object
    ///
    /// # Returns
    /// * `Ok(AgentId)` - If the handle is valid
    /// * `Err(String)` - If the handle is invalid
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if Self::is_valid(&id) {
            Ok(AgentId(id))
        } else {
            Err(format!("Invalid agent id: {}", id))
        }
    }

    /// Validates an agent handle
    ///
    /// # Validation Rules
    /// - 1 to 64 characters
    /// - Letters, digits, underscore, hyphen only
    fn is_valid(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= 64
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    /// Returns the handle as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role an agent fills on the team; tasks are routed by matching role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    BackendDev,
    FrontendDev,
    Qa,
    Docs,
    Manager,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::BackendDev => "backend_dev",
            AgentRole::FrontendDev => "frontend_dev",
            AgentRole::Qa => "qa",
            AgentRole::Docs => "docs",
            AgentRole::Manager => "manager",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backend_dev" => Ok(AgentRole::BackendDev),
            "frontend_dev" => Ok(AgentRole::FrontendDev),
            "qa" => Ok(AgentRole::Qa),
            "docs" => Ok(AgentRole::Docs),
            "manager" => Ok(AgentRole::Manager),
            other => Err(format!("Unknown agent role: {}", other)),
        }
    }
}

/// Skill ladder for agents and task difficulty
///
/// The ladder is cumulative: a senior agent may take junior or senior
/// tasks, a principal agent may take any, a junior agent only junior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Junior,
    Senior,
    Principal,
}

impl SkillLevel {
    fn rank(&self) -> u8 {
        match self {
            SkillLevel::Junior => 1,
            SkillLevel::Senior => 2,
            SkillLevel::Principal => 3,
        }
    }

    /// Whether an agent at this level may take a task of the given difficulty
    ///
    /// # Example
    /// ```
    /// use swarmdeck_api::domain::agent::SkillLevel;
    ///
    /// assert!(SkillLevel::Senior.can_take(SkillLevel::Junior));
    /// assert!(!SkillLevel::Senior.can_take(SkillLevel::Principal));
    /// ```
    pub fn can_take(&self, difficulty: SkillLevel) -> bool {
        self.rank() >= difficulty.rank()
    }

    /// The difficulties an agent at this level is allowed to work on
    pub fn takeable_difficulties(&self) -> &'static [SkillLevel] {
        match self {
            SkillLevel::Junior => &[SkillLevel::Junior],
            SkillLevel::Senior => &[SkillLevel::Junior, SkillLevel::Senior],
            SkillLevel::Principal => &[
                SkillLevel::Junior,
                SkillLevel::Senior,
                SkillLevel::Principal,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Junior => "junior",
            SkillLevel::Senior => "senior",
            SkillLevel::Principal => "principal",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "junior" => Ok(SkillLevel::Junior),
            "senior" => Ok(SkillLevel::Senior),
            "principal" => Ok(SkillLevel::Principal),
            other => Err(format!("Unknown skill level: {}", other)),
        }
    }
}

/// Activity status of a registered agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Working,
    Offline,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Working => "working",
            AgentStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(AgentStatus::Idle),
            "working" => Ok(AgentStatus::Working),
            "offline" => Ok(AgentStatus::Offline),
            other => Err(format!("Unknown agent status: {}", other)),
        }
    }
}

/// How the agent is connected to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Interactive,
    Automated,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Interactive => "interactive",
            ConnectionType::Automated => "automated",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interactive" => Ok(ConnectionType::Interactive),
            "automated" => Ok(ConnectionType::Automated),
            other => Err(format!("Unknown connection type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_agent_id() {
        assert!(AgentId::new("backend_007").is_ok());
    }

    #[test]
    fn valid_agent_id_with_hyphen() {
        assert!(AgentId::new("qa-bot-2").is_ok());
    }

    #[test]
    fn invalid_agent_id_empty() {
        assert!(AgentId::new("").is_err());
    }

    #[test]
    fn invalid_agent_id_with_spaces() {
        assert!(AgentId::new("backend dev").is_err());
    }

    #[test]
    fn invalid_agent_id_with_at_sign() {
        assert!(AgentId::new("@backend").is_err());
    }

    #[test]
    fn invalid_agent_id_too_long() {
        assert!(AgentId::new("a".repeat(65)).is_err());
    }

    #[test]
    fn agent_id_display() {
        let id = AgentId::new("docs_01").unwrap();
        assert_eq!(format!("{}", id), "docs_01");
    }

    #[test]
    fn junior_takes_only_junior() {
        assert!(SkillLevel::Junior.can_take(SkillLevel::Junior));
        assert!(!SkillLevel::Junior.can_take(SkillLevel::Senior));
        assert!(!SkillLevel::Junior.can_take(SkillLevel::Principal));
    }

    #[test]
    fn senior_takes_junior_and_senior() {
        assert!(SkillLevel::Senior.can_take(SkillLevel::Junior));
        assert!(SkillLevel::Senior.can_take(SkillLevel::Senior));
        assert!(!SkillLevel::Senior.can_take(SkillLevel::Principal));
    }

    #[test]
    fn principal_takes_everything() {
        assert!(SkillLevel::Principal.can_take(SkillLevel::Junior));
        assert!(SkillLevel::Principal.can_take(SkillLevel::Senior));
        assert!(SkillLevel::Principal.can_take(SkillLevel::Principal));
    }

    #[test]
    fn role_round_trip() {
        for role in [
            AgentRole::BackendDev,
            AgentRole::FrontendDev,
            AgentRole::Qa,
            AgentRole::Docs,
            AgentRole::Manager,
        ] {
            assert_eq!(role.as_str().parse::<AgentRole>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_rejected() {
        assert!("designer".parse::<AgentRole>().is_err());
    }
}
