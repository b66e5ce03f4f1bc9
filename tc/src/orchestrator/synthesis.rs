//! Session summary derived from completed outcomes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{AgentRole, RiskLevel, RoleOutcome};
use crate::llm::TokenUsage;
use crate::takt::TaktMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionSummary {
    /// From the Strategy and Workflow roles
    pub strategic_recommendations: Vec<String>,
    /// From the Implementation and Scheduling roles
    pub implementation_plan: Vec<String>,
    pub risk_mitigation: Vec<String>,
    pub success_metrics: Vec<String>,

    /// Median of reported duration estimates
    pub consensus_duration_weeks: Option<f64>,
    /// Most reported risk level; ties go to the higher level
    pub consensus_risk: Option<RiskLevel>,

    pub takt: TaktMetrics,
    pub completed_roles: Vec<AgentRole>,
    pub missing_roles: Vec<AgentRole>,
    pub usage: TokenUsage,
}

/// Median of a set of values; `None` when empty
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn recommendations_from(outcomes: &[RoleOutcome], roles: &[AgentRole]) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for role in roles {
        let found = outcomes
            .iter()
            .filter_map(RoleOutcome::response)
            .filter(|r| r.role == *role)
            .flat_map(|r| r.estimates.recommendations.iter());
        for item in found {
            if !items.iter().any(|existing| existing.eq_ignore_ascii_case(item)) {
                items.push(item.clone());
            }
        }
    }
    items
}

/// Build the summary for a set of outcomes
pub fn synthesize(outcomes: &[RoleOutcome], takt: TaktMetrics) -> SessionSummary {
    debug!(outcomes = outcomes.len(), "synthesize: called");
    let responses: Vec<_> = outcomes.iter().filter_map(RoleOutcome::response).collect();

    let durations: Vec<f64> = responses.iter().filter_map(|r| r.estimates.duration_weeks).collect();

    let mut risk_votes: BTreeMap<RiskLevel, usize> = BTreeMap::new();
    for level in responses.iter().filter_map(|r| r.estimates.risk_level) {
        *risk_votes.entry(level).or_default() += 1;
    }
    // BTreeMap iterates low to high, so max_by_key keeps the last (highest) tie
    let consensus_risk = risk_votes
        .into_iter()
        .max_by_key(|(_, votes)| *votes)
        .map(|(level, _)| level);

    SessionSummary {
        strategic_recommendations: recommendations_from(outcomes, &[AgentRole::Strategy, AgentRole::Workflow]),
        implementation_plan: recommendations_from(outcomes, &[AgentRole::Implementation, AgentRole::Scheduling]),
        risk_mitigation: recommendations_from(outcomes, &[AgentRole::Risk]),
        success_metrics: recommendations_from(outcomes, &[AgentRole::DataAnalyst]),
        consensus_duration_weeks: median(&durations),
        consensus_risk,
        takt,
        completed_roles: responses.iter().map(|r| r.role).collect(),
        missing_roles: outcomes
            .iter()
            .filter(|o| o.is_missing())
            .map(RoleOutcome::role)
            .collect(),
        usage: responses
            .iter()
            .fold(TokenUsage::default(), |acc, r| acc + r.meta.usage),
    }
}
