//! Orchestrator configuration

use serde::{Deserialize, Serialize};

use crate::domain::AgentRole;

/// What to do when one role's generation fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Record the role as missing and keep going
    #[default]
    Continue,
    /// Stop the session and report the failed role
    Abort,
}

/// How roles are scheduled within a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// One role at a time, in configured order
    #[default]
    Sequential,
    /// Roles whose upstream roles are finished run concurrently
    Waves,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Waves => write!(f, "waves"),
        }
    }
}

/// Orchestration settings (`orchestrator:` in the config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Invocation order; also the outcome order
    pub order: Vec<AgentRole>,

    #[serde(rename = "failure-policy")]
    pub failure_policy: FailurePolicy,

    pub mode: ExecutionMode,

    /// Relative tolerance for numeric cross-checks, in percent
    #[serde(rename = "duration-tolerance-pct")]
    pub duration_tolerance_pct: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            order: AgentRole::ALL.to_vec(),
            failure_policy: FailurePolicy::default(),
            mode: ExecutionMode::default(),
            duration_tolerance_pct: 10.0,
        }
    }
}
