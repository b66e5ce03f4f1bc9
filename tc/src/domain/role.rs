//! The six advisory roles
//!
//! Role-based dispatch: one `Agent` type is parameterized by an `AgentRole`,
//! which supplies the prompt template, framing, and upstream dependencies.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Advisory role identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentRole {
    /// Portfolio and enterprise-level TAKT strategy
    Strategy,
    /// Process efficiency and flow synchronization
    Workflow,
    /// Takt time, resource allocation, task sequencing
    Scheduling,
    /// Predictive analytics over project data
    DataAnalyst,
    /// Risk and variability control
    Risk,
    /// Adoption, training, and change management
    Implementation,
}

impl AgentRole {
    /// All roles in the default invocation order
    pub const ALL: [AgentRole; 6] = [
        AgentRole::Strategy,
        AgentRole::Workflow,
        AgentRole::Scheduling,
        AgentRole::DataAnalyst,
        AgentRole::Risk,
        AgentRole::Implementation,
    ];

    /// Stable identifier used in config, CLI, and template names
    pub fn id(&self) -> &'static str {
        match self {
            Self::Strategy => "strategy",
            Self::Workflow => "workflow",
            Self::Scheduling => "scheduling",
            Self::DataAnalyst => "data-analyst",
            Self::Risk => "risk",
            Self::Implementation => "implementation",
        }
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Strategy => "Strategy",
            Self::Workflow => "Workflow",
            Self::Scheduling => "Scheduling",
            Self::DataAnalyst => "Data Analysis",
            Self::Risk => "Risk",
            Self::Implementation => "Implementation",
        }
    }

    /// Persona the prompt frames the model as
    pub fn title(&self) -> &'static str {
        match self {
            Self::Strategy => "TAKT Strategy Architect",
            Self::Workflow => "Workflow Optimization Specialist",
            Self::Scheduling => "TAKT Scheduling & Resource Engineer",
            Self::DataAnalyst => "TAKT Data Analyst",
            Self::Risk => "Risk & Variability Controller",
            Self::Implementation => "Implementation & Training Specialist",
        }
    }

    pub fn expertise(&self) -> &'static str {
        match self {
            Self::Strategy => "Portfolio & Enterprise-Level TAKT Implementation",
            Self::Workflow => "Process Efficiency & Flow Synchronization",
            Self::Scheduling => "Advanced Scheduling & Resource Allocation",
            Self::DataAnalyst => "Predictive Analytics & Optimization",
            Self::Risk => "TAKT Risk Management & Adaptability",
            Self::Implementation => "TAKT Adoption & Change Management",
        }
    }

    /// Roles whose output this role consumes as context
    ///
    /// Only upstream roles that ran earlier in the configured order and
    /// completed are actually passed in.
    pub fn upstream(&self) -> &'static [AgentRole] {
        match self {
            Self::Strategy => &[],
            Self::Workflow => &[AgentRole::Strategy],
            Self::Scheduling => &[AgentRole::Strategy, AgentRole::Workflow],
            Self::DataAnalyst => &[AgentRole::Scheduling],
            Self::Risk => &[AgentRole::Strategy, AgentRole::Scheduling],
            Self::Implementation => &[
                AgentRole::Strategy,
                AgentRole::Workflow,
                AgentRole::Scheduling,
                AgentRole::Risk,
            ],
        }
    }

    /// Whether this role cannot run without work packages
    pub fn requires_work_packages(&self) -> bool {
        matches!(self, Self::Workflow | Self::Scheduling)
    }

    /// Name of the prompt template for this role
    pub fn template_name(&self) -> &'static str {
        self.id()
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "AgentRole::from_str: called");
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "strategy" | "strategy-architect" => Ok(Self::Strategy),
            "workflow" | "workflow-specialist" => Ok(Self::Workflow),
            "scheduling" | "scheduling-engineer" => Ok(Self::Scheduling),
            "data-analyst" | "data-analysis" | "data" | "analyst" => Ok(Self::DataAnalyst),
            "risk" | "risk-controller" => Ok(Self::Risk),
            "implementation" | "implementation-specialist" | "training" => Ok(Self::Implementation),
            _ => Err(format!(
                "Unknown role: {}. Use: {}",
                s,
                Self::ALL.iter().map(|r| r.id()).collect::<Vec<_>>().join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<&str> = AgentRole::ALL.iter().map(|r| r.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_from_str_accepts_ids_and_aliases() {
        for role in AgentRole::ALL {
            assert_eq!(role.id().parse::<AgentRole>(), Ok(role));
        }
        assert_eq!("Data Analyst".parse::<AgentRole>(), Ok(AgentRole::DataAnalyst));
        assert_eq!("risk_controller".parse::<AgentRole>(), Ok(AgentRole::Risk));
        assert!("marketing".parse::<AgentRole>().is_err());
    }

    #[test]
    fn test_upstream_roles_precede_in_default_order() {
        for (idx, role) in AgentRole::ALL.iter().enumerate() {
            for up in role.upstream() {
                let up_idx = AgentRole::ALL.iter().position(|r| r == up).unwrap();
                assert!(up_idx < idx, "{} depends on later role {}", role, up);
            }
        }
    }

    #[test]
    fn test_serde_uses_kebab_ids() {
        let json = serde_json::to_string(&AgentRole::DataAnalyst).unwrap();
        assert_eq!(json, "\"data-analyst\"");
        let role: AgentRole = serde_yaml::from_str("implementation").unwrap();
        assert_eq!(role, AgentRole::Implementation);
    }

    #[test]
    fn test_scheduling_roles_need_work_packages() {
        assert!(AgentRole::Scheduling.requires_work_packages());
        assert!(AgentRole::Workflow.requires_work_packages());
        assert!(!AgentRole::Strategy.requires_work_packages());
    }
}
