//! Project input: the context every agent advises on

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::AgentRole;

fn default_working_days() -> u32 {
    5
}

fn default_buffer_pct() -> f64 {
    15.0
}

/// A unit of work scheduled through the takt plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkPackage {
    pub name: String,

    /// Quantity of work (units)
    pub work_amount: f64,

    /// Units completed per crew member per hour
    pub productivity_rate: f64,

    /// Names of earlier packages this one waits on
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl WorkPackage {
    pub fn new(name: impl Into<String>, work_amount: f64, productivity_rate: f64) -> Self {
        Self {
            name: name.into(),
            work_amount,
            productivity_rate,
            dependencies: Vec::new(),
        }
    }

    pub fn after(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }
}

/// Immutable project description handed to every agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectContext {
    pub name: String,

    /// e.g. "Commercial Construction", "Manufacturing"
    pub project_type: String,

    /// Size in the project's own unit (sq ft, units)
    pub size: f64,

    pub duration_weeks: f64,

    /// Available working time, hours per day
    pub available_hours: f64,

    #[serde(default = "default_working_days")]
    pub working_days_per_week: u32,

    /// Customer demand, units per day
    pub customer_demand: f64,

    #[serde(default)]
    pub crew_size: Option<u32>,

    #[serde(default = "default_buffer_pct")]
    pub buffer_pct: f64,

    /// Caller-ordered; order is preserved everywhere
    #[serde(default)]
    pub work_packages: Vec<WorkPackage>,
}

/// Why a project context cannot be planned
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    #[error("Project {0} must not be empty")]
    Empty(&'static str),

    #[error("Project {field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("Project {field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Role {role} requires at least one work package")]
    NoWorkPackages { role: AgentRole },

    #[error("Work package '{name}' is invalid: {reason}")]
    InvalidWorkPackage { name: String, reason: String },

    #[error("Duplicate work package: {0}")]
    DuplicateWorkPackage(String),

    #[error("Work package '{package}' depends on '{dependency}', which is not an earlier package")]
    UnknownDependency { package: String, dependency: String },
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ContextError> {
    // NaN fails this comparison too
    if value > 0.0 {
        Ok(())
    } else {
        Err(ContextError::NotPositive { field, value })
    }
}

fn require_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ContextError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ContextError::OutOfRange { field, value, min, max })
    }
}

impl ProjectContext {
    /// Load a project from a YAML or JSON file, chosen by extension
    pub fn load(path: &Path) -> Result<Self> {
        debug!(?path, "ProjectContext::load: called");
        let content = fs::read_to_string(path).context(format!("Failed to read project file: {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            debug!("ProjectContext::load: parsing as JSON");
            serde_json::from_str(&content).context(format!("Failed to parse project JSON: {}", path.display()))
        } else {
            debug!("ProjectContext::load: parsing as YAML");
            serde_yaml::from_str(&content).context(format!("Failed to parse project YAML: {}", path.display()))
        }
    }

    /// Structural validation independent of which roles will run
    pub fn validate(&self) -> Result<(), ContextError> {
        debug!(name = %self.name, "ProjectContext::validate: called");
        if self.name.trim().is_empty() {
            return Err(ContextError::Empty("name"));
        }
        if self.project_type.trim().is_empty() {
            return Err(ContextError::Empty("project-type"));
        }
        require_positive("size", self.size)?;
        require_positive("duration-weeks", self.duration_weeks)?;
        require_positive("available-hours", self.available_hours)?;
        require_range("available-hours", self.available_hours, 0.0, 24.0)?;
        require_range("working-days-per-week", f64::from(self.working_days_per_week), 1.0, 7.0)?;
        require_range("customer-demand", self.customer_demand, 0.0, f64::MAX)?;
        require_range("buffer-pct", self.buffer_pct, 0.0, 100.0)?;
        if self.crew_size == Some(0) {
            return Err(ContextError::NotPositive {
                field: "crew-size",
                value: 0.0,
            });
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for package in &self.work_packages {
            if package.name.trim().is_empty() {
                return Err(ContextError::InvalidWorkPackage {
                    name: package.name.clone(),
                    reason: "name must not be empty".to_string(),
                });
            }
            if !(package.work_amount > 0.0) {
                return Err(ContextError::InvalidWorkPackage {
                    name: package.name.clone(),
                    reason: format!("work amount must be positive, got {}", package.work_amount),
                });
            }
            if !(package.productivity_rate > 0.0) {
                return Err(ContextError::InvalidWorkPackage {
                    name: package.name.clone(),
                    reason: format!("productivity rate must be positive, got {}", package.productivity_rate),
                });
            }
            for dependency in &package.dependencies {
                if !seen.contains(dependency.as_str()) {
                    return Err(ContextError::UnknownDependency {
                        package: package.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
            if !seen.insert(package.name.as_str()) {
                return Err(ContextError::DuplicateWorkPackage(package.name.clone()));
            }
        }

        Ok(())
    }

    /// Validate for a given set of roles
    ///
    /// Hard checks fail; role-specific advisory checks are logged only.
    pub fn validate_for(&self, roles: &[AgentRole]) -> Result<(), ContextError> {
        debug!(name = %self.name, ?roles, "ProjectContext::validate_for: called");
        self.validate()?;

        if self.work_packages.is_empty()
            && let Some(role) = roles.iter().find(|r| r.requires_work_packages())
        {
            return Err(ContextError::NoWorkPackages { role: *role });
        }

        for role in roles {
            for note in self.advisories(*role) {
                warn!(role = %role, %note, "ProjectContext::validate_for: advisory");
            }
        }

        Ok(())
    }

    /// Non-fatal observations about the context for a role
    pub fn advisories(&self, role: AgentRole) -> Vec<String> {
        let mut notes = Vec::new();
        if matches!(role, AgentRole::Scheduling | AgentRole::DataAnalyst) && self.customer_demand <= 0.0 {
            notes.push("customer demand is zero; takt time is undefined".to_string());
        }
        if matches!(role, AgentRole::Scheduling | AgentRole::Implementation) && self.crew_size.is_none() {
            notes.push("crew size not given; recommended crew size is used".to_string());
        }
        if role == AgentRole::Risk && self.buffer_pct == 0.0 {
            notes.push("no schedule buffer configured".to_string());
        }
        notes
    }
}

/// Parse a comma-separated role list
pub fn parse_roles(list: &str) -> Result<Vec<AgentRole>> {
    debug!(%list, "parse_roles: called");
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<AgentRole>().map_err(|e| eyre!(e)))
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A small, valid commercial project used across unit tests
    pub fn sample_project() -> ProjectContext {
        ProjectContext {
            name: "Riverside Tower".to_string(),
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
                WorkPackage::new("Framing", 960.0, 3.0).after("Foundation"),
                WorkPackage::new("Finishes", 320.0, 1.0).after("Framing"),
            ],
        }
    }
}
