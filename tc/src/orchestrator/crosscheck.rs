//! Cross-validation of agent estimates
//!
//! Advisory only: findings never change the outcomes they describe.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{AgentResponse, AgentRole, RoleOutcome};
use crate::takt::TaktMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    DurationMismatch,
    TaktTimeMismatch,
    RiskLevelMismatch,
    /// Informational: a role produced no response
    RoleMissing,
}

impl FindingKind {
    pub fn is_mismatch(&self) -> bool {
        !matches!(self, FindingKind::RoleMissing)
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FindingKind::DurationMismatch => write!(f, "duration mismatch"),
            FindingKind::TaktTimeMismatch => write!(f, "takt time mismatch"),
            FindingKind::RiskLevelMismatch => write!(f, "risk level mismatch"),
            FindingKind::RoleMissing => write!(f, "role missing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub roles: Vec<AgentRole>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrossCheckReport {
    pub tolerance_pct: f64,
    pub findings: Vec<Finding>,
}

impl CrossCheckReport {
    /// True when no estimates disagree; missing roles don't count
    pub fn is_consistent(&self) -> bool {
        !self.findings.iter().any(|f| f.kind.is_mismatch())
    }

    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    /// Findings that involve a role
    pub fn for_role(&self, role: AgentRole) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.roles.contains(&role))
    }
}

/// Relative difference of two values in percent of the larger magnitude
pub fn relative_difference_pct(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale * 100.0
    }
}

fn fmt_value(value: f64) -> String {
    let s = format!("{:.1}", value);
    s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
}

fn compare_pair(a: &AgentResponse, b: &AgentResponse, tolerance_pct: f64, findings: &mut Vec<Finding>) {
    if let (Some(da), Some(db)) = (a.estimates.duration_weeks, b.estimates.duration_weeks) {
        let diff = relative_difference_pct(da, db);
        if diff > tolerance_pct {
            debug!(a = %a.role, b = %b.role, %da, %db, "compare_pair: duration mismatch");
            findings.push(Finding {
                kind: FindingKind::DurationMismatch,
                roles: vec![a.role, b.role],
                message: format!(
                    "{} estimates {} weeks but {} estimates {} weeks ({:.0}% apart)",
                    a.role,
                    fmt_value(da),
                    b.role,
                    fmt_value(db),
                    diff
                ),
            });
        }
    }

    if let (Some(ra), Some(rb)) = (a.estimates.risk_level, b.estimates.risk_level)
        && ra != rb
    {
        debug!(a = %a.role, b = %b.role, "compare_pair: risk mismatch");
        findings.push(Finding {
            kind: FindingKind::RiskLevelMismatch,
            roles: vec![a.role, b.role],
            message: format!("{} rates risk {} but {} rates it {}", a.role, ra, b.role, rb),
        });
    }
}

/// Compare estimates across completed roles and against computed takt time
pub fn cross_check(outcomes: &[RoleOutcome], metrics: &TaktMetrics, tolerance_pct: f64) -> CrossCheckReport {
    debug!(outcomes = outcomes.len(), %tolerance_pct, "cross_check: called");
    let mut findings = Vec::new();

    let responses: Vec<&AgentResponse> = outcomes.iter().filter_map(RoleOutcome::response).collect();
    for (i, a) in responses.iter().enumerate() {
        for b in &responses[i + 1..] {
            compare_pair(a, b, tolerance_pct, &mut findings);
        }
    }

    // Takt time is undefined without demand
    if metrics.takt_time_hours > 0.0 {
        for response in &responses {
            if let Some(reported) = response.estimates.takt_time_hours {
                let diff = relative_difference_pct(reported, metrics.takt_time_hours);
                if diff > tolerance_pct {
                    findings.push(Finding {
                        kind: FindingKind::TaktTimeMismatch,
                        roles: vec![response.role],
                        message: format!(
                            "{} reports takt time {} hours; computed takt time is {} hours",
                            response.role,
                            fmt_value(reported),
                            fmt_value(metrics.takt_time_hours)
                        ),
                    });
                }
            }
        }
    }

    for outcome in outcomes {
        if let RoleOutcome::Missing { role, cause, .. } = outcome {
            findings.push(Finding {
                kind: FindingKind::RoleMissing,
                roles: vec![*role],
                message: format!("{} produced no response: {}", role, cause),
            });
        }
    }

    let report = CrossCheckReport {
        tolerance_pct,
        findings,
    };
    info!(
        findings = report.findings.len(),
        consistent = report.is_consistent(),
        "Cross-check complete"
    );
    report
}
