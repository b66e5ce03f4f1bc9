//! Advisory agents
//!
//! One `Agent` type serves all six roles. The role picks the prompt
//! template and framing; the client behind it is whatever the config
//! resolves for that role.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{AgentRequest, AgentResponse, AgentRole, ContextError, GenerationMeta};
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, create_client};
use crate::prompts::{PromptContext, PromptLoader};
use crate::takt::TaktMetrics;

mod extract;

pub use extract::extract_estimates;

/// Source of timestamps for generated responses
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Clock backed by the system time
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Why an agent produced no response
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{role} agent generation failed: {source}")]
    Generation {
        role: AgentRole,
        #[source]
        source: LlmError,
    },

    #[error("{role} agent prompt error: {message}")]
    Prompt { role: AgentRole, message: String },

    #[error("{role} agent cannot run: {source}")]
    InvalidContext {
        role: AgentRole,
        #[source]
        source: ContextError,
    },

    #[error("{role} agent received a request for {requested}")]
    RoleMismatch { role: AgentRole, requested: AgentRole },

    #[error("{role} agent could not parse its output: {message}")]
    Extraction { role: AgentRole, message: String },
}

impl AgentError {
    pub fn role(&self) -> AgentRole {
        match self {
            AgentError::Generation { role, .. }
            | AgentError::Prompt { role, .. }
            | AgentError::InvalidContext { role, .. }
            | AgentError::RoleMismatch { role, .. }
            | AgentError::Extraction { role, .. } => *role,
        }
    }

    /// Short category for reporting a missing role
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Generation { source, .. } => source.kind(),
            AgentError::Prompt { .. } => "prompt",
            AgentError::InvalidContext { .. } => "invalid-context",
            AgentError::RoleMismatch { .. } => "role-mismatch",
            AgentError::Extraction { .. } => "extraction",
        }
    }
}

/// A role-specific prompt wrapper around one model gateway client
pub struct Agent {
    role: AgentRole,
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
    clock: Clock,
}

impl Agent {
    pub fn new(role: AgentRole, client: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>) -> Self {
        debug!(%role, provider = client.provider(), model = client.model(), "Agent::new: called");
        Self {
            role,
            client,
            prompts,
            max_tokens: 4096,
            clock: system_clock(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn provider(&self) -> &str {
        self.client.provider()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Produce exactly one response for this agent's role
    ///
    /// Never retries; transport retries live in the client.
    pub async fn run(&self, request: &AgentRequest<'_>) -> Result<AgentResponse, AgentError> {
        debug!(role = %self.role, upstream = request.upstream.len(), "Agent::run: called");
        if request.role != self.role {
            return Err(AgentError::RoleMismatch {
                role: self.role,
                requested: request.role,
            });
        }

        if self.role.requires_work_packages() && request.context.work_packages.is_empty() {
            return Err(AgentError::InvalidContext {
                role: self.role,
                source: ContextError::NoWorkPackages { role: self.role },
            });
        }
        for note in request.context.advisories(self.role) {
            warn!(role = %self.role, %note, "Agent::run: advisory");
        }

        let metrics = TaktMetrics::compute(request.context);
        let context = PromptContext::new(request, &metrics);
        let (system_prompt, user_prompt) =
            self.prompts
                .render_role(self.role, &context)
                .map_err(|e| AgentError::Prompt {
                    role: self.role,
                    message: e.to_string(),
                })?;

        let completion = CompletionRequest {
            agent: Some(self.role.id().to_string()),
            system_prompt,
            messages: vec![Message::user(user_prompt)],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .complete(completion)
            .await
            .map_err(|source| AgentError::Generation { role: self.role, source })?;

        let text = response
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AgentError::Generation {
                role: self.role,
                source: LlmError::InvalidResponse("empty completion".to_string()),
            })?;

        let estimates = extract_estimates(&text, request.context.working_days_per_week).map_err(|e| {
            AgentError::Extraction {
                role: self.role,
                message: e.to_string(),
            }
        })?;
        debug!(role = %self.role, ?estimates, "Agent::run: extracted estimates");

        info!(
            role = %self.role,
            provider = self.client.provider(),
            tokens = response.usage.total(),
            "Agent completed"
        );

        Ok(AgentResponse {
            role: self.role,
            text,
            estimates,
            meta: GenerationMeta {
                provider: self.client.provider().to_string(),
                model: self.client.model().to_string(),
                generated_at: (self.clock)(),
                usage: response.usage,
                stop_reason: response.stop_reason,
            },
        })
    }
}

/// Build one agent per role from config, each with its resolved client
pub fn build_agents(config: &Config, roles: &[AgentRole], prompts: Arc<PromptLoader>) -> Result<BTreeMap<AgentRole, Agent>> {
    debug!(?roles, "build_agents: called");
    let mut agents = BTreeMap::new();
    for role in roles {
        let resolved = config.resolve_role(*role)?;
        let client = create_client(&resolved).context(format!("Failed to create client for {} agent", role))?;
        let agent = Agent::new(*role, client, prompts.clone()).with_max_tokens(resolved.max_tokens);
        agents.insert(*role, agent);
    }
    Ok(agents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::sample_project;
    use crate::domain::RiskLevel;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::MockLlmClient;

    fn fixed_clock() -> Clock {
        Arc::new(|| DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default())
    }

    fn agent(role: AgentRole, responses: Vec<CompletionResponse>) -> (Agent, Arc<MockLlmClient>) {
        let mock = Arc::new(MockLlmClient::new(responses));
        let agent = Agent::new(role, mock.clone(), Arc::new(PromptLoader::embedded_only())).with_clock(fixed_clock());
        (agent, mock)
    }

    #[tokio::test]
    async fn test_run_produces_response_with_estimates() {
        let (agent, mock) = agent(
            AgentRole::Scheduling,
            vec![CompletionResponse::text(
                "Plan...\nESTIMATED DURATION: 9 weeks\nTAKT TIME: 2 hours\nRISK LEVEL: low\n",
            )],
        );
        let project = sample_project();
        let response = agent.run(&AgentRequest::new(AgentRole::Scheduling, &project)).await.unwrap();

        assert_eq!(response.role, AgentRole::Scheduling);
        assert_eq!(response.estimates.duration_weeks, Some(9.0));
        assert_eq!(response.estimates.risk_level, Some(RiskLevel::Low));
        assert_eq!(response.meta.provider, "mock");
        assert_eq!(response.meta.generated_at, fixed_clock()());

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].agent.as_deref(), Some("scheduling"));
        assert!(requests[0].system_prompt.contains("TAKT Scheduling"));
        assert!(requests[0].user_text().contains("Riverside Tower"));
    }

    #[tokio::test]
    async fn test_gateway_error_is_typed() {
        let (agent, _mock) = agent(AgentRole::Risk, vec![]);
        let project = sample_project();
        let err = agent.run(&AgentRequest::new(AgentRole::Risk, &project)).await.unwrap_err();

        assert!(matches!(err, AgentError::Generation { role: AgentRole::Risk, .. }));
        assert_eq!(err.role(), AgentRole::Risk);
    }

    #[tokio::test]
    async fn test_scheduling_role_without_packages_makes_no_call() {
        let (agent, mock) = agent(AgentRole::Workflow, vec![CompletionResponse::text("unused")]);
        let mut project = sample_project();
        project.work_packages.clear();

        let err = agent.run(&AgentRequest::new(AgentRole::Workflow, &project)).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidContext { .. }));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_role_mismatch() {
        let (agent, mock) = agent(AgentRole::Strategy, vec![CompletionResponse::text("unused")]);
        let project = sample_project();
        let err = agent.run(&AgentRequest::new(AgentRole::Risk, &project)).await.unwrap_err();
        assert!(matches!(err, AgentError::RoleMismatch { .. }));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_completion_is_generation_error() {
        let (agent, _mock) = agent(AgentRole::Strategy, vec![CompletionResponse::text("   ")]);
        let project = sample_project();
        let err = agent.run(&AgentRequest::new(AgentRole::Strategy, &project)).await.unwrap_err();
        assert_eq!(err.kind(), "malformed-response");
    }
}
