//! Orchestrator - runs the advisory roles and assembles a session

use std::collections::{BTreeMap, HashSet};

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::{ExecutionMode, FailurePolicy, OrchestratorConfig};
use super::crosscheck::cross_check;
use super::synthesis::synthesize;
use crate::agent::{Agent, AgentError, Clock, system_clock};
use crate::domain::{
    AgentRequest, AgentResponse, AgentRole, ContextError, PlanningSession, ProjectContext, RoleOutcome, generate_id,
};
use crate::takt::TaktMetrics;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid project context: {0}")]
    InvalidContext(#[from] ContextError),

    #[error("Role order is empty")]
    EmptyOrder,

    #[error("Role {0} appears more than once in the order")]
    DuplicateRole(AgentRole),

    #[error("No agent configured for role {0}")]
    MissingAgent(AgentRole),

    #[error("Cross-check tolerance must be a finite, non-negative percentage, got {0}")]
    InvalidTolerance(f64),

    #[error("Session aborted: {role} failed")]
    Aborted {
        role: AgentRole,
        #[source]
        source: AgentError,
    },
}

/// Sequences agent invocations and builds planning sessions
///
/// Holds no per-session state; one orchestrator can run many sessions.
pub struct Orchestrator {
    agents: BTreeMap<AgentRole, Agent>,
    config: OrchestratorConfig,
    clock: Clock,
}

impl Orchestrator {
    pub fn new(agents: impl IntoIterator<Item = Agent>, config: OrchestratorConfig) -> Self {
        let agents: BTreeMap<AgentRole, Agent> = agents.into_iter().map(|a| (a.role(), a)).collect();
        debug!(agents = agents.len(), order = ?config.order, mode = %config.mode, "Orchestrator::new: called");
        Self {
            agents,
            config,
            clock: system_clock(),
        }
    }

    /// Use a fixed time source for sessions and responses
    pub fn with_clock(mut self, clock: Clock) -> Self {
        for agent in self.agents.values_mut() {
            agent.set_clock(clock.clone());
        }
        self.clock = clock;
        self
    }

    /// Check the order and context; runs before any agent call
    pub fn validate(&self, context: &ProjectContext) -> Result<(), OrchestratorError> {
        debug!(name = %context.name, "Orchestrator::validate: called");
        if self.config.order.is_empty() {
            return Err(OrchestratorError::EmptyOrder);
        }

        let tolerance = self.config.duration_tolerance_pct;
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(OrchestratorError::InvalidTolerance(tolerance));
        }

        let mut seen = HashSet::new();
        for role in &self.config.order {
            if !seen.insert(*role) {
                return Err(OrchestratorError::DuplicateRole(*role));
            }
            if !self.agents.contains_key(role) {
                return Err(OrchestratorError::MissingAgent(*role));
            }
        }

        context.validate_for(&self.config.order)?;
        Ok(())
    }

    fn agent(&self, role: AgentRole) -> Result<&Agent, OrchestratorError> {
        self.agents.get(&role).ok_or(OrchestratorError::MissingAgent(role))
    }

    /// Completed upstream responses for the role at `position`, in configured order
    fn upstream_for<'a>(
        &self,
        role: AgentRole,
        position: usize,
        completed: &'a BTreeMap<AgentRole, AgentResponse>,
    ) -> Vec<&'a AgentResponse> {
        self.config.order[..position]
            .iter()
            .filter(|r| role.upstream().contains(*r))
            .filter_map(|r| completed.get(r))
            .collect()
    }

    /// Turn an agent result into an outcome, applying the failure policy
    fn settle(&self, role: AgentRole, result: Result<AgentResponse, AgentError>) -> Result<RoleOutcome, OrchestratorError> {
        match result {
            Ok(response) => Ok(RoleOutcome::Completed(response)),
            Err(err) => match self.config.failure_policy {
                FailurePolicy::Abort => {
                    warn!(%role, error = %err, "Role failed, aborting session");
                    Err(OrchestratorError::Aborted { role, source: err })
                }
                FailurePolicy::Continue => {
                    warn!(%role, error = %err, "Role failed, marking missing");
                    Ok(RoleOutcome::Missing {
                        role,
                        kind: err.kind().to_string(),
                        cause: err.to_string(),
                    })
                }
            },
        }
    }

    async fn run_sequential(&self, context: &ProjectContext) -> Result<Vec<RoleOutcome>, OrchestratorError> {
        debug!("Orchestrator::run_sequential: called");
        let mut completed: BTreeMap<AgentRole, AgentResponse> = BTreeMap::new();
        let mut outcomes = Vec::with_capacity(self.config.order.len());

        for (position, role) in self.config.order.iter().enumerate() {
            let agent = self.agent(*role)?;
            let result = {
                let upstream = self.upstream_for(*role, position, &completed);
                let request = AgentRequest::new(*role, context).with_upstream(upstream);
                agent.run(&request).await
            };

            let outcome = self.settle(*role, result)?;
            if let RoleOutcome::Completed(response) = &outcome {
                completed.insert(*role, response.clone());
            }
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Wave index per position: one past the latest wave of any earlier upstream role
    fn waves(&self) -> Vec<usize> {
        let order = &self.config.order;
        let mut waves: Vec<usize> = Vec::with_capacity(order.len());
        for (position, role) in order.iter().enumerate() {
            let wave = order[..position]
                .iter()
                .zip(waves.iter())
                .filter(|(r, _)| role.upstream().contains(*r))
                .map(|(_, w)| w + 1)
                .max()
                .unwrap_or(0);
            waves.push(wave);
        }
        waves
    }

    async fn run_waves(&self, context: &ProjectContext) -> Result<Vec<RoleOutcome>, OrchestratorError> {
        let waves = self.waves();
        debug!(?waves, "Orchestrator::run_waves: called");
        let mut completed: BTreeMap<AgentRole, AgentResponse> = BTreeMap::new();
        let mut slots: Vec<Option<RoleOutcome>> = vec![None; self.config.order.len()];

        let last_wave = waves.iter().copied().max().unwrap_or(0);
        for wave in 0..=last_wave {
            let mut members = Vec::new();
            for (position, role) in self.config.order.iter().enumerate() {
                if waves[position] == wave {
                    members.push((position, *role, self.agent(*role)?));
                }
            }
            debug!(%wave, roles = members.len(), "Orchestrator::run_waves: starting wave");

            let results = {
                let completed = &completed;
                join_all(members.into_iter().map(|(position, role, agent)| {
                    let upstream = self.upstream_for(role, position, completed);
                    async move {
                        let request = AgentRequest::new(role, context).with_upstream(upstream);
                        (position, role, agent.run(&request).await)
                    }
                }))
                .await
            };

            // join_all preserves input order, which is configured order
            for (position, role, result) in results {
                let outcome = self.settle(role, result)?;
                if let RoleOutcome::Completed(response) = &outcome {
                    completed.insert(role, response.clone());
                }
                slots[position] = Some(outcome);
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Run every configured role against a project and assemble the session
    pub async fn run(&self, context: &ProjectContext) -> Result<PlanningSession, OrchestratorError> {
        debug!(name = %context.name, "Orchestrator::run: called");
        self.validate(context)?;

        let created_at = (self.clock)();
        info!(
            project = %context.name,
            roles = self.config.order.len(),
            mode = %self.config.mode,
            "Planning session started"
        );

        let outcomes = match self.config.mode {
            ExecutionMode::Sequential => self.run_sequential(context).await?,
            ExecutionMode::Waves => self.run_waves(context).await?,
        };

        let metrics = TaktMetrics::compute(context);
        let crosscheck = cross_check(&outcomes, &metrics, self.config.duration_tolerance_pct);
        let summary = synthesize(&outcomes, metrics);

        let session = PlanningSession {
            id: generate_id("session", &context.name, created_at),
            created_at,
            project: context.clone(),
            outcomes,
            crosscheck,
            summary,
        };

        info!(
            session = %session.id,
            completed = session.summary.completed_roles.len(),
            missing = session.summary.missing_roles.len(),
            findings = session.crosscheck.findings.len(),
            "Planning session finished"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::sample_project;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::MockLlmClient;
    use crate::prompts::PromptLoader;
    use std::sync::Arc;

    fn agents(text: &str) -> Vec<Agent> {
        let prompts = Arc::new(PromptLoader::embedded_only());
        AgentRole::ALL
            .iter()
            .map(|role| {
                let mock = Arc::new(MockLlmClient::new(vec![CompletionResponse::text(text)]));
                Agent::new(*role, mock, prompts.clone())
            })
            .collect()
    }

    #[test]
    fn test_default_waves() {
        let orchestrator = Orchestrator::new(agents("ok"), OrchestratorConfig::default());
        // strategy, workflow, scheduling, data-analyst, risk, implementation
        assert_eq!(orchestrator.waves(), vec![0, 1, 2, 3, 3, 4]);
    }

    #[test]
    fn test_waves_ignore_later_upstream() {
        let config = OrchestratorConfig {
            order: vec![AgentRole::Scheduling, AgentRole::Strategy, AgentRole::Risk],
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(agents("ok"), config);
        assert_eq!(orchestrator.waves(), vec![0, 0, 1]);
    }

    #[test]
    fn test_validate_rejects_bad_order() {
        let project = sample_project();

        let empty = OrchestratorConfig {
            order: vec![],
            ..Default::default()
        };
        let err = Orchestrator::new(agents("ok"), empty).validate(&project).unwrap_err();
        assert!(matches!(err, OrchestratorError::EmptyOrder));

        let duplicate = OrchestratorConfig {
            order: vec![AgentRole::Risk, AgentRole::Strategy, AgentRole::Risk],
            ..Default::default()
        };
        let err = Orchestrator::new(agents("ok"), duplicate).validate(&project).unwrap_err();
        assert!(matches!(err, OrchestratorError::DuplicateRole(AgentRole::Risk)));
    }

    #[tokio::test]
    async fn test_run_rejects_bad_tolerance_before_any_call() {
        for tolerance in [-5.0, f64::NAN, f64::INFINITY] {
            let mock = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("ok")]));
            let agent = Agent::new(AgentRole::Strategy, mock.clone(), Arc::new(PromptLoader::embedded_only()));
            let config = OrchestratorConfig {
                order: vec![AgentRole::Strategy],
                duration_tolerance_pct: tolerance,
                ..Default::default()
            };
            let err = Orchestrator::new(vec![agent], config).run(&sample_project()).await.unwrap_err();
            assert!(matches!(err, OrchestratorError::InvalidTolerance(_)), "{}", tolerance);
            assert_eq!(mock.call_count(), 0);
        }
    }

    #[test]
    fn test_validate_requires_agent_for_each_role() {
        let some_agents: Vec<Agent> = agents("ok").into_iter().filter(|a| a.role() != AgentRole::Risk).collect();
        let err = Orchestrator::new(some_agents, OrchestratorConfig::default())
            .validate(&sample_project())
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::MissingAgent(AgentRole::Risk)));
    }

    #[tokio::test]
    async fn test_run_passes_upstream_context() {
        let prompts = Arc::new(PromptLoader::embedded_only());
        let strategy_mock = Arc::new(MockLlmClient::new(vec![CompletionResponse::text(
            "Phase by floor.\nESTIMATED DURATION: 12 weeks",
        )]));
        let workflow_mock = Arc::new(MockLlmClient::new(vec![CompletionResponse::text(
            "Zone by trade.\nESTIMATED DURATION: 12 weeks",
        )]));
        let config = OrchestratorConfig {
            order: vec![AgentRole::Strategy, AgentRole::Workflow],
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(
            vec![
                Agent::new(AgentRole::Strategy, strategy_mock.clone(), prompts.clone()),
                Agent::new(AgentRole::Workflow, workflow_mock.clone(), prompts),
            ],
            config,
        );

        let session = orchestrator.run(&sample_project()).await.unwrap();

        assert_eq!(session.roles(), vec![AgentRole::Strategy, AgentRole::Workflow]);
        assert!(session.crosscheck.is_consistent());
        assert!(!strategy_mock.requests()[0].user_text().contains("Phase by floor."));
        assert!(workflow_mock.requests()[0].user_text().contains("Phase by floor."));
    }
}
