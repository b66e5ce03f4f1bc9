//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use taktcouncil::agent::{Agent, Clock};
use taktcouncil::domain::{AgentRole, ProjectContext, WorkPackage};
use taktcouncil::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use taktcouncil::prompts::PromptLoader;

/// Answer every role with the same estimates
pub const AGREEING_TEXT: &str = "\
Phase the work floor by floor.

ESTIMATED DURATION: 12 weeks
TAKT TIME: 2 hours
RISK LEVEL: Medium

RECOMMENDATIONS:
- Pilot the takt plan on one floor
- Hold a daily huddle per zone
";

/// What a stubbed role answers with
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Timeout,
    Malformed,
}

/// Gateway stub that answers per role and records every request
///
/// Roles are routed by `CompletionRequest::agent`; roles without a
/// scripted reply get `AGREEING_TEXT`.
pub struct ScriptedClient {
    replies: HashMap<String, Reply>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(mut self, role: AgentRole, reply: Reply) -> Self {
        self.replies.insert(role.id().to_string(), reply);
        self
    }

    pub fn text(self, role: AgentRole, text: impl Into<String>) -> Self {
        self.reply(role, Reply::Text(text.into()))
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Roles in the order they were called
    pub fn called_roles(&self) -> Vec<String> {
        self.requests().into_iter().filter_map(|r| r.agent).collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn provider(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let role = request.agent.clone().unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        match self.replies.get(&role) {
            Some(Reply::Timeout) => Err(LlmError::Timeout(Duration::from_secs(120))),
            Some(Reply::Malformed) => Err(LlmError::InvalidResponse("missing content".to_string())),
            Some(Reply::Text(text)) => Ok(response(text)),
            None => Ok(response(AGREEING_TEXT)),
        }
    }
}

fn response(text: &str) -> CompletionResponse {
    CompletionResponse {
        content: Some(text.to_string()),
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage {
            input_tokens: 200,
            output_tokens: 100,
        },
    }
}

/// One agent per role, all sharing the same client
pub fn agents(client: Arc<ScriptedClient>) -> Vec<Agent> {
    let prompts = Arc::new(PromptLoader::embedded_only());
    AgentRole::ALL
        .iter()
        .map(|role| Agent::new(*role, client.clone(), prompts.clone()))
        .collect()
}

pub fn fixed_clock() -> Clock {
    Arc::new(|| DateTime::<Utc>::from_timestamp(1_750_000_000, 0).unwrap())
}

/// A valid project: takt time 8 h / 4 units = 2 hours
pub fn project() -> ProjectContext {
    ProjectContext {
        name: "Harbor Logistics Center".to_string(),
        project_type: "Commercial Construction".to_string(),
        size: 120_000.0,
        duration_weeks: 12.0,
        available_hours: 8.0,
        working_days_per_week: 5,
        customer_demand: 4.0,
        crew_size: Some(8),
        buffer_pct: 15.0,
        work_packages: vec![
            WorkPackage::new("Foundation", 640.0, 2.0),
            WorkPackage::new("Steel", 960.0, 3.0).after("Foundation"),
            WorkPackage::new("Envelope", 320.0, 1.0).after("Steel"),
        ],
    }
}

/// The same project as YAML, for CLI tests
pub const PROJECT_YAML: &str = "\
name: Harbor Logistics Center
project-type: Commercial Construction
size: 120000
duration-weeks: 12
available-hours: 8
customer-demand: 4
crew-size: 8
work-packages:
  - name: Foundation
    work-amount: 640
    productivity-rate: 2
  - name: Steel
    work-amount: 960
    productivity-rate: 3
    dependencies: [Foundation]
  - name: Envelope
    work-amount: 320
    productivity-rate: 1
    dependencies: [Steel]
";
