//! Session views
//!
//! Shapes a `PlanningSession` into the five named views. Each view has a
//! serializable form (what a UI or `--format json` consumes) and a text
//! rendering for the terminal.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use colored::*;
use serde::Serialize;
use tracing::debug;

use crate::domain::{AgentRole, PlanningSession, ProjectContext, RiskLevel, RoleOutcome};
use crate::orchestrator::{Finding, SessionSummary};
use crate::takt::{TaktMetrics, area_takt};

/// Risk categories every project is assessed against
pub const RISK_CATEGORIES: [&str; 4] = ["Weather", "Supply Chain", "Labor", "Technical"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Dashboard,
    ProjectAnalysis,
    TaktPlanning,
    Reports,
    Training,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Dashboard,
        View::ProjectAnalysis,
        View::TaktPlanning,
        View::Reports,
        View::Training,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::ProjectAnalysis => "Project Analysis",
            View::TaktPlanning => "TAKT Planning",
            View::Reports => "Reports",
            View::Training => "Training",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl std::str::FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "View::from_str: called");
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "dashboard" => Ok(View::Dashboard),
            "project-analysis" | "analysis" => Ok(View::ProjectAnalysis),
            "takt-planning" | "takt" | "planning" => Ok(View::TaktPlanning),
            "reports" | "report" => Ok(View::Reports),
            "training" => Ok(View::Training),
            _ => Err(format!(
                "Unknown view: {}. Use: dashboard, project-analysis, takt-planning, reports, or training",
                s
            )),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DashboardView<'a> {
    pub session_id: &'a str,
    pub project: &'a str,
    pub created_at: DateTime<Utc>,
    pub completed_roles: usize,
    pub missing_roles: &'a [AgentRole],
    pub planned_duration_weeks: f64,
    pub consensus_duration_weeks: Option<f64>,
    pub computed_duration_weeks: f64,
    pub consensus_risk: Option<RiskLevel>,
    pub takt_time_hours: f64,
    pub findings: usize,
    pub consistent: bool,
    pub total_tokens: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RoleRow {
    pub role: AgentRole,
    pub status: &'static str,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub duration_weeks: Option<f64>,
    pub takt_time_hours: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    pub recommendations: usize,
    pub cause: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectAnalysisView<'a> {
    pub project: &'a ProjectContext,
    pub size_risk: RiskLevel,
    pub recommended_crew: u32,
    pub area_takt_hours_per_1000: f64,
    pub risk_categories: [&'static str; 4],
    pub roles: Vec<RoleRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaktPlanningView<'a> {
    pub project: &'a str,
    pub planned_duration_weeks: f64,
    pub buffer_pct: f64,
    pub fits_duration: bool,
    pub takt: &'a TaktMetrics,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RoleReport<'a> {
    pub role: AgentRole,
    pub title: &'static str,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportsView<'a> {
    pub summary: &'a SessionSummary,
    pub findings: &'a [Finding],
    pub responses: Vec<RoleReport<'a>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrainingModule {
    pub title: &'static str,
    pub hours: u32,
    pub level: &'static str,
    pub topics: [&'static str; 4],
    pub prerequisite: Option<&'static str>,
}

/// Standard TAKT curriculum
pub static TRAINING_MODULES: [TrainingModule; 4] = [
    TrainingModule {
        title: "TAKT Fundamentals",
        hours: 4,
        level: "Beginner",
        topics: [
            "Introduction to TAKT Planning",
            "Core Principles and Concepts",
            "Benefits and Applications",
            "Basic Implementation Steps",
        ],
        prerequisite: None,
    },
    TrainingModule {
        title: "Advanced TAKT Planning",
        hours: 8,
        level: "Intermediate",
        topics: [
            "Detailed TAKT Time Calculation",
            "Work Package Optimization",
            "Resource Leveling",
            "Buffer Management",
        ],
        prerequisite: Some("TAKT Fundamentals"),
    },
    TrainingModule {
        title: "TAKT Implementation",
        hours: 6,
        level: "Advanced",
        topics: [
            "Implementation Strategy",
            "Team Organization",
            "Progress Monitoring",
            "Continuous Improvement",
        ],
        prerequisite: Some("Advanced TAKT Planning"),
    },
    TrainingModule {
        title: "Digital Tools for TAKT",
        hours: 4,
        level: "Intermediate",
        topics: [
            "TAKT Planning Software",
            "Digital Collaboration Tools",
            "Data Collection and Analysis",
            "Reporting and Dashboards",
        ],
        prerequisite: Some("TAKT Fundamentals"),
    },
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrainingView<'a> {
    pub modules: &'static [TrainingModule],
    pub rollout_plan: &'a [String],
    pub implementation_advice: Option<&'a str>,
}

pub fn dashboard(session: &PlanningSession) -> DashboardView<'_> {
    DashboardView {
        session_id: &session.id,
        project: &session.project.name,
        created_at: session.created_at,
        completed_roles: session.summary.completed_roles.len(),
        missing_roles: &session.summary.missing_roles,
        planned_duration_weeks: session.project.duration_weeks,
        consensus_duration_weeks: session.summary.consensus_duration_weeks,
        computed_duration_weeks: session.summary.takt.total_weeks,
        consensus_risk: session.summary.consensus_risk,
        takt_time_hours: session.summary.takt.takt_time_hours,
        findings: session.crosscheck.findings.len(),
        consistent: session.crosscheck.is_consistent(),
        total_tokens: session.summary.usage.total(),
    }
}

pub fn project_analysis(session: &PlanningSession) -> ProjectAnalysisView<'_> {
    let roles = session
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            RoleOutcome::Completed(response) => RoleRow {
                role: response.role,
                status: "completed",
                provider: Some(response.meta.provider.clone()),
                model: Some(response.meta.model.clone()),
                duration_weeks: response.estimates.duration_weeks,
                takt_time_hours: response.estimates.takt_time_hours,
                risk_level: response.estimates.risk_level,
                recommendations: response.estimates.recommendations.len(),
                cause: None,
            },
            RoleOutcome::Missing { role, cause, .. } => RoleRow {
                role: *role,
                status: "missing",
                provider: None,
                model: None,
                duration_weeks: None,
                takt_time_hours: None,
                risk_level: None,
                recommendations: 0,
                cause: Some(cause.clone()),
            },
        })
        .collect();

    ProjectAnalysisView {
        project: &session.project,
        size_risk: session.summary.takt.size_risk,
        recommended_crew: session.summary.takt.recommended_crew,
        area_takt_hours_per_1000: area_takt(&session.project),
        risk_categories: RISK_CATEGORIES,
        roles,
    }
}

pub fn takt_planning<'a>(project: &'a ProjectContext, takt: &'a TaktMetrics) -> TaktPlanningView<'a> {
    TaktPlanningView {
        project: &project.name,
        planned_duration_weeks: project.duration_weeks,
        buffer_pct: project.buffer_pct,
        fits_duration: takt.fits_duration(),
        takt,
    }
}

pub fn reports(session: &PlanningSession) -> ReportsView<'_> {
    ReportsView {
        summary: &session.summary,
        findings: &session.crosscheck.findings,
        responses: session
            .responses()
            .map(|r| RoleReport {
                role: r.role,
                title: r.role.title(),
                text: &r.text,
            })
            .collect(),
    }
}

pub fn training(session: &PlanningSession) -> TrainingView<'_> {
    TrainingView {
        modules: &TRAINING_MODULES,
        rollout_plan: &session.summary.implementation_plan,
        implementation_advice: session.response(AgentRole::Implementation).map(|r| r.text.as_str()),
    }
}

/// Serializable form of a view
pub fn view_json(session: &PlanningSession, view: View) -> serde_json::Result<serde_json::Value> {
    debug!(%view, "view_json: called");
    match view {
        View::Dashboard => serde_json::to_value(dashboard(session)),
        View::ProjectAnalysis => serde_json::to_value(project_analysis(session)),
        View::TaktPlanning => serde_json::to_value(takt_planning(&session.project, &session.summary.takt)),
        View::Reports => serde_json::to_value(reports(session)),
        View::Training => serde_json::to_value(training(session)),
    }
}

fn num(value: f64) -> String {
    let s = format!("{:.1}", value);
    s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
}

fn opt_num(value: Option<f64>) -> String {
    value.map(num).unwrap_or_else(|| "-".to_string())
}

fn opt_risk(value: Option<RiskLevel>) -> String {
    value.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title.bold());
    let _ = writeln!(out, "{}", "-".repeat(title.len()));
}

fn bullets(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out, "{}", title.cyan());
    if items.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

fn render_dashboard(out: &mut String, session: &PlanningSession) {
    let view = dashboard(session);
    heading(out, &format!("Dashboard: {}", view.project));
    let _ = writeln!(out, "Session:            {}", view.session_id);
    let _ = writeln!(out, "Created:            {}", view.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(
        out,
        "Roles:              {} completed, {} missing",
        view.completed_roles,
        view.missing_roles.len()
    );
    let _ = writeln!(out, "Planned duration:   {} weeks", num(view.planned_duration_weeks));
    let _ = writeln!(out, "Council consensus:  {} weeks", opt_num(view.consensus_duration_weeks));
    let _ = writeln!(out, "Computed plan:      {} weeks", num(view.computed_duration_weeks));
    let _ = writeln!(out, "Consensus risk:     {}", opt_risk(view.consensus_risk));
    let _ = writeln!(out, "Takt time:          {} hours/unit", num(view.takt_time_hours));
    let consistency = if view.consistent {
        "consistent".green()
    } else {
        "inconsistent".yellow()
    };
    let _ = writeln!(out, "Cross-check:        {} ({} findings)", consistency, view.findings);
    let _ = writeln!(out, "Tokens:             {}", view.total_tokens);
}

fn render_project_analysis(out: &mut String, session: &PlanningSession) {
    let view = project_analysis(session);
    heading(out, "Project Analysis");
    let _ = writeln!(
        out,
        "{} ({}), size {}",
        view.project.name,
        view.project.project_type,
        num(view.project.size)
    );
    let _ = writeln!(out, "Size-based risk:    {}", view.size_risk);
    let _ = writeln!(out, "Recommended crew:   {}", view.recommended_crew);
    let _ = writeln!(out, "Area takt:          {} hours per 1000 units", num(view.area_takt_hours_per_1000));
    let _ = writeln!(out, "Risk categories:    {}", view.risk_categories.join(", "));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<16} {:<10} {:>8} {:>8} {:<7} {}",
        "ROLE", "STATUS", "WEEKS", "TAKT", "RISK", "MODEL"
    );
    for row in &view.roles {
        let status = if row.status == "completed" {
            row.status.green()
        } else {
            row.status.red()
        };
        let _ = writeln!(
            out,
            "{:<16} {:<10} {:>8} {:>8} {:<7} {}",
            row.role.label(),
            status,
            opt_num(row.duration_weeks),
            opt_num(row.takt_time_hours),
            opt_risk(row.risk_level),
            row.model.as_deref().or(row.cause.as_deref()).unwrap_or("-")
        );
    }
}

/// Text rendering of the TAKT plan for a project
pub fn render_takt_text(project: &ProjectContext, takt: &TaktMetrics) -> String {
    let mut out = String::new();
    let view = takt_planning(project, takt);
    heading(&mut out, &format!("TAKT Planning: {}", view.project));
    let _ = writeln!(out, "Takt time:          {} hours/unit", num(takt.takt_time_hours));
    let _ = writeln!(
        out,
        "Crew size:          {} (recommended {})",
        takt.crew_size, takt.recommended_crew
    );
    let _ = writeln!(out, "Buffer:             {}%", num(view.buffer_pct));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<24} {:>8} {:>8} {:>8} {:>8}",
        "WORK PACKAGE", "START", "DAYS", "BUFFER", "FINISH"
    );
    for package in &takt.packages {
        let _ = writeln!(
            out,
            "{:<24} {:>8} {:>8} {:>8} {:>8}",
            package.name,
            num(package.start_day),
            num(package.base_days),
            num(package.buffer_days),
            num(package.finish_day)
        );
    }
    let _ = writeln!(out);
    let fit = if view.fits_duration {
        "within plan".green()
    } else {
        "over plan".red()
    };
    let _ = writeln!(
        out,
        "Total: {} working days ({} weeks) vs {} planned, {} ({}%)",
        num(takt.total_days),
        num(takt.total_weeks),
        num(view.planned_duration_weeks),
        fit,
        num(takt.schedule_variance_pct)
    );
    out
}

fn render_reports(out: &mut String, session: &PlanningSession) {
    let view = reports(session);
    heading(out, "Reports");
    bullets(out, "Strategic recommendations", &view.summary.strategic_recommendations);
    bullets(out, "Implementation plan", &view.summary.implementation_plan);
    bullets(out, "Risk mitigation", &view.summary.risk_mitigation);
    bullets(out, "Success metrics", &view.summary.success_metrics);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "Cross-check findings".cyan());
    if view.findings.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for finding in view.findings {
        let marker = if finding.kind.is_mismatch() {
            "!".yellow()
        } else {
            "i".normal()
        };
        let _ = writeln!(out, "  {} [{}] {}", marker, finding.kind, finding.message);
    }
    for response in &view.responses {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", format!("== {} ==", response.title).bold());
        let _ = writeln!(out, "{}", response.text.trim_end());
    }
}

fn render_training(out: &mut String, session: &PlanningSession) {
    let view = training(session);
    heading(out, "Training & Implementation");
    for module in view.modules {
        let prerequisite = module.prerequisite.unwrap_or("none");
        let _ = writeln!(
            out,
            "{} ({} hours, {}; prerequisite: {})",
            module.title.bold(),
            module.hours,
            module.level,
            prerequisite
        );
        for topic in module.topics {
            let _ = writeln!(out, "  - {}", topic);
        }
    }
    let _ = writeln!(out);
    bullets(out, "Rollout plan", view.rollout_plan);
    if let Some(advice) = view.implementation_advice {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", advice.trim_end());
    }
}

/// Text rendering of one view
pub fn render_text(session: &PlanningSession, view: View) -> String {
    debug!(%view, "render_text: called");
    let mut out = String::new();
    match view {
        View::Dashboard => render_dashboard(&mut out, session),
        View::ProjectAnalysis => render_project_analysis(&mut out, session),
        View::TaktPlanning => out.push_str(&render_takt_text(&session.project, &session.summary.takt)),
        View::Reports => render_reports(&mut out, session),
        View::Training => render_training(&mut out, session),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::sample_project;
    use crate::domain::{AgentResponse, Estimates, GenerationMeta};
    use crate::llm::{StopReason, TokenUsage};
    use crate::orchestrator::{cross_check, synthesize};

    fn session() -> PlanningSession {
        let project = sample_project();
        let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let outcomes = vec![
            RoleOutcome::Completed(AgentResponse {
                role: AgentRole::Strategy,
                text: "Phase by floor.".to_string(),
                estimates: Estimates {
                    duration_weeks: Some(12.0),
                    recommendations: vec!["Pilot on level 2".to_string()],
                    ..Default::default()
                },
                meta: GenerationMeta {
                    provider: "mock".to_string(),
                    model: "mock-model".to_string(),
                    generated_at: at,
                    usage: TokenUsage::default(),
                    stop_reason: StopReason::EndTurn,
                },
            }),
            RoleOutcome::Missing {
                role: AgentRole::Scheduling,
                kind: "timeout".to_string(),
                cause: "timed out".to_string(),
            },
        ];
        let takt = TaktMetrics::compute(&project);
        PlanningSession {
            id: "abc123-session-riverside-tower".to_string(),
            created_at: at,
            crosscheck: cross_check(&outcomes, &takt, 10.0),
            summary: synthesize(&outcomes, takt),
            project,
            outcomes,
        }
    }

    #[test]
    fn test_view_from_str() {
        assert_eq!("takt".parse::<View>(), Ok(View::TaktPlanning));
        assert_eq!("Project Analysis".parse::<View>(), Ok(View::ProjectAnalysis));
        assert!("charts".parse::<View>().is_err());
    }

    #[test]
    fn test_every_view_renders() {
        let session = session();
        for view in View::ALL {
            assert!(!render_text(&session, view).is_empty(), "{} rendered empty", view);
            assert!(view_json(&session, view).unwrap().is_object());
        }
    }

    #[test]
    fn test_dashboard_json() {
        let json = view_json(&session(), View::Dashboard).unwrap();
        assert_eq!(json["completed-roles"], 1);
        assert_eq!(json["missing-roles"][0], "scheduling");
        assert_eq!(json["consensus-duration-weeks"], 12.0);
    }

    #[test]
    fn test_project_analysis_lists_roles_in_order() {
        let session = session();
        let view = project_analysis(&session);
        let statuses: Vec<&str> = view.roles.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec!["completed", "missing"]);
        assert_eq!(view.risk_categories.len(), 4);
    }

    #[test]
    fn test_takt_text_lists_packages() {
        let project = sample_project();
        let text = render_takt_text(&project, &TaktMetrics::compute(&project));
        assert!(text.contains("Foundation"));
        assert!(text.contains("Finishes"));
        assert!(text.contains("17.2 working days") || text.contains("17.3 working days"));
    }

    #[test]
    fn test_reports_include_findings_and_text() {
        let text = render_text(&session(), View::Reports);
        assert!(text.contains("Pilot on level 2"));
        assert!(text.contains("Scheduling produced no response"));
        assert!(text.contains("Phase by floor."));
    }
}
