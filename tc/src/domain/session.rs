//! Agent requests, responses, and the aggregate planning session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AgentRole, Estimates, ProjectContext};
use crate::llm::{StopReason, TokenUsage};
use crate::orchestrator::{CrossCheckReport, SessionSummary};

/// Input for one agent invocation; built per orchestration step
#[derive(Debug, Clone)]
pub struct AgentRequest<'a> {
    pub role: AgentRole,
    pub context: &'a ProjectContext,

    /// Completed upstream responses, in configured order
    pub upstream: Vec<&'a AgentResponse>,
}

impl<'a> AgentRequest<'a> {
    pub fn new(role: AgentRole, context: &'a ProjectContext) -> Self {
        Self {
            role,
            context,
            upstream: Vec::new(),
        }
    }

    pub fn with_upstream(mut self, upstream: Vec<&'a AgentResponse>) -> Self {
        self.upstream = upstream;
        self
    }
}

/// Where and when a response was generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GenerationMeta {
    pub provider: String,
    pub model: String,
    pub generated_at: DateTime<Utc>,
    pub usage: TokenUsage,
    pub stop_reason: StopReason,
}

/// One agent's advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AgentResponse {
    pub role: AgentRole,
    pub text: String,
    pub estimates: Estimates,
    pub meta: GenerationMeta,
}

/// Result slot for a role in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RoleOutcome {
    Completed(AgentResponse),

    /// Placeholder for a role whose generation failed
    Missing {
        role: AgentRole,
        /// Error category, e.g. "timeout", "rate-limited"
        kind: String,
        cause: String,
    },
}

impl RoleOutcome {
    pub fn role(&self) -> AgentRole {
        match self {
            RoleOutcome::Completed(response) => response.role,
            RoleOutcome::Missing { role, .. } => *role,
        }
    }

    pub fn response(&self) -> Option<&AgentResponse> {
        match self {
            RoleOutcome::Completed(response) => Some(response),
            RoleOutcome::Missing { .. } => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RoleOutcome::Missing { .. })
    }
}

/// Aggregate result of one orchestration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlanningSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub project: ProjectContext,

    /// One entry per configured role, in configured order
    pub outcomes: Vec<RoleOutcome>,

    pub crosscheck: CrossCheckReport,
    pub summary: SessionSummary,
}

impl PlanningSession {
    /// Completed responses in order
    pub fn responses(&self) -> impl Iterator<Item = &AgentResponse> {
        self.outcomes.iter().filter_map(RoleOutcome::response)
    }

    pub fn response(&self, role: AgentRole) -> Option<&AgentResponse> {
        self.responses().find(|r| r.role == role)
    }

    pub fn roles(&self) -> Vec<AgentRole> {
        self.outcomes.iter().map(RoleOutcome::role).collect()
    }

    pub fn missing_roles(&self) -> Vec<AgentRole> {
        self.outcomes
            .iter()
            .filter(|o| o.is_missing())
            .map(RoleOutcome::role)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| !o.is_missing())
    }

    pub fn total_usage(&self) -> TokenUsage {
        self.responses().fold(TokenUsage::default(), |acc, r| acc + r.meta.usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(role: AgentRole) -> AgentResponse {
        AgentResponse {
            role,
            text: "advice".to_string(),
            estimates: Estimates::default(),
            meta: GenerationMeta {
                provider: "mock".to_string(),
                model: "mock-model".to_string(),
                generated_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
                usage: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 5,
                },
                stop_reason: StopReason::EndTurn,
            },
        }
    }

    #[test]
    fn test_outcome_accessors() {
        let done = RoleOutcome::Completed(response(AgentRole::Risk));
        let missing = RoleOutcome::Missing {
            role: AgentRole::Workflow,
            kind: "timeout".to_string(),
            cause: "Request timed out after 1s".to_string(),
        };

        assert_eq!(done.role(), AgentRole::Risk);
        assert!(done.response().is_some());
        assert_eq!(missing.role(), AgentRole::Workflow);
        assert!(missing.is_missing());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let missing = RoleOutcome::Missing {
            role: AgentRole::DataAnalyst,
            kind: "auth".to_string(),
            cause: "bad key".to_string(),
        };
        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json["status"], "missing");
        assert_eq!(json["role"], "data-analyst");

        let done = serde_json::to_value(RoleOutcome::Completed(response(AgentRole::Strategy))).unwrap();
        assert_eq!(done["status"], "completed");
        assert_eq!(done["role"], "strategy");
    }
}
