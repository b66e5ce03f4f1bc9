//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::domain::{AgentRequest, AgentRole};
use crate::takt::TaktMetrics;

/// Format a number for a prompt: two decimals, trailing zeros dropped
fn fmt_num(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

#[derive(Debug, Clone, Serialize)]
struct ProjectView {
    name: String,
    project_type: String,
    size: String,
    duration_weeks: String,
    available_hours: String,
    working_days_per_week: u32,
    customer_demand: String,
    buffer_pct: String,
}

#[derive(Debug, Clone, Serialize)]
struct PackageView {
    name: String,
    work_amount: String,
    productivity_rate: String,
    dependencies: String,
    total_days: String,
}

#[derive(Debug, Clone, Serialize)]
struct TaktView {
    takt_time_hours: String,
    crew_size: u32,
    recommended_crew: u32,
    size_risk: String,
    total_days: String,
    total_weeks: String,
    schedule_variance_pct: String,
}

#[derive(Debug, Clone, Serialize)]
struct UpstreamView {
    label: String,
    text: String,
}

/// Context for rendering prompt templates
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub role_id: String,
    pub role_title: String,
    pub role_expertise: String,
    project: ProjectView,
    packages: Vec<PackageView>,
    takt: TaktView,
    upstream: Vec<UpstreamView>,
}

impl PromptContext {
    /// Build the rendering context for one agent request
    pub fn new(request: &AgentRequest<'_>, metrics: &TaktMetrics) -> Self {
        debug!(role = %request.role, upstream = request.upstream.len(), "PromptContext::new: called");
        let ctx = request.context;

        let packages = ctx
            .work_packages
            .iter()
            .zip(metrics.packages.iter())
            .map(|(package, schedule)| PackageView {
                name: package.name.clone(),
                work_amount: fmt_num(package.work_amount),
                productivity_rate: fmt_num(package.productivity_rate),
                dependencies: package.dependencies.join(", "),
                total_days: fmt_num(schedule.total_days),
            })
            .collect();

        let upstream = request
            .upstream
            .iter()
            .map(|response| UpstreamView {
                label: response.role.title().to_string(),
                text: response.text.clone(),
            })
            .collect();

        Self {
            role_id: request.role.id().to_string(),
            role_title: request.role.title().to_string(),
            role_expertise: request.role.expertise().to_string(),
            project: ProjectView {
                name: ctx.name.clone(),
                project_type: ctx.project_type.clone(),
                size: fmt_num(ctx.size),
                duration_weeks: fmt_num(ctx.duration_weeks),
                available_hours: fmt_num(ctx.available_hours),
                working_days_per_week: ctx.working_days_per_week,
                customer_demand: fmt_num(ctx.customer_demand),
                buffer_pct: fmt_num(ctx.buffer_pct),
            },
            packages,
            takt: TaktView {
                takt_time_hours: fmt_num(metrics.takt_time_hours),
                crew_size: metrics.crew_size,
                recommended_crew: metrics.recommended_crew,
                size_risk: metrics.size_risk.to_string(),
                total_days: fmt_num(metrics.total_days),
                total_weeks: fmt_num(metrics.total_weeks),
                schedule_variance_pct: fmt_num(metrics.schedule_variance_pct),
            },
            upstream,
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Directory from `prompts.dir` in config
    config_dir: Option<PathBuf>,
    /// Project override directory (e.g., `.taktcouncil/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a new prompt loader rooted at `workdir`
    ///
    /// `config_dir` takes precedence over `{workdir}/.taktcouncil/prompts`.
    pub fn new(workdir: impl AsRef<Path>, config_dir: Option<PathBuf>) -> Self {
        let workdir = workdir.as_ref();
        debug!(?workdir, ?config_dir, "PromptLoader::new: called");
        let user_dir = workdir.join(".taktcouncil/prompts");

        let user_dir = if user_dir.exists() {
            debug!(?user_dir, "PromptLoader::new: project override directory found");
            Some(user_dir)
        } else {
            debug!("PromptLoader::new: no project override directory");
            None
        };

        let config_dir = config_dir.filter(|dir| {
            let exists = dir.exists();
            debug!(?dir, %exists, "PromptLoader::new: checking configured directory");
            exists
        });

        Self {
            hbs: Self::engine(),
            config_dir,
            user_dir,
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            config_dir: None,
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Configured directory: `{prompts.dir}/{name}.pmt`
    /// 2. Project override: `.taktcouncil/prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in [&self.config_dir, &self.user_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found");
        }

        debug!("PromptLoader::load_template: trying embedded fallback");
        if let Some(content) = embedded::get_embedded(name) {
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, role = %context.role_id, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the (system, user) prompt pair for a role
    pub fn render_role(&self, role: AgentRole, context: &PromptContext) -> Result<(String, String)> {
        debug!(%role, "PromptLoader::render_role: called");
        let system = self.render("system", context)?;
        let user = self.render(role.template_name(), context)?;
        Ok((system, user))
    }
}
