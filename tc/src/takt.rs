//! Deterministic TAKT calculations
//!
//! Used to ground agent prompts and as the reference the cross-check
//! compares reported takt times against.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ProjectContext, RiskLevel, WorkPackage};

/// Square feet (or units) one crew member covers, for crew sizing
const SIZE_PER_CREW_MEMBER: f64 = 5000.0;

/// Smallest crew ever recommended
const MIN_CREW: u32 = 5;

/// Takt time in hours per unit
///
/// Returns 0 when there is no demand.
pub fn takt_time(available_hours: f64, customer_demand: f64) -> f64 {
    if customer_demand > 0.0 {
        available_hours / customer_demand
    } else {
        0.0
    }
}

/// Crew size suggested by project size, capped by the available crew
pub fn recommended_crew(size: f64, crew_size: Option<u32>) -> u32 {
    let by_size = (size / SIZE_PER_CREW_MEMBER).floor();
    let by_size = if by_size.is_finite() && by_size > 0.0 {
        by_size.min(f64::from(u32::MAX)) as u32
    } else {
        0
    };
    by_size.min(crew_size.unwrap_or(u32::MAX)).max(MIN_CREW)
}

/// Hours of planned working time per 1000 units of project size
pub fn area_takt(context: &ProjectContext) -> f64 {
    let planned_hours = context.duration_weeks * f64::from(context.working_days_per_week) * context.available_hours;
    if context.size > 0.0 {
        planned_hours / (context.size / 1000.0)
    } else {
        0.0
    }
}

/// Scheduled span of one work package, in working days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageSchedule {
    pub name: String,
    pub base_days: f64,
    pub buffer_days: f64,
    pub total_days: f64,
    pub start_day: f64,
    pub finish_day: f64,
    pub dependencies: Vec<String>,
}

/// Working days for a package: work / (rate x crew x hours), plus buffer
pub fn package_days(package: &WorkPackage, crew: u32, hours_per_day: f64, buffer_pct: f64) -> (f64, f64) {
    let capacity = package.productivity_rate * f64::from(crew) * hours_per_day;
    if capacity <= 0.0 {
        return (0.0, 0.0);
    }
    let base = package.work_amount / capacity;
    (base, base * buffer_pct / 100.0)
}

/// Computed TAKT figures for a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaktMetrics {
    /// Hours per unit of demand
    pub takt_time_hours: f64,

    /// Crew size the package durations were computed with
    pub crew_size: u32,
    pub recommended_crew: u32,
    pub size_risk: RiskLevel,

    /// In caller order; each package starts when its latest dependency finishes
    pub packages: Vec<PackageSchedule>,
    /// Latest finish across all packages
    pub total_days: f64,
    pub total_weeks: f64,

    /// Planned weeks versus the project's duration, in percent
    pub schedule_variance_pct: f64,
}

impl TaktMetrics {
    /// Compute metrics for a validated project
    pub fn compute(context: &ProjectContext) -> Self {
        debug!(name = %context.name, packages = context.work_packages.len(), "TaktMetrics::compute: called");
        let recommended = recommended_crew(context.size, context.crew_size);
        let crew = context.crew_size.unwrap_or(recommended);

        // Dependencies name earlier packages, so one pass in caller order suffices
        let mut finishes: HashMap<&str, f64> = HashMap::new();
        let mut packages: Vec<PackageSchedule> = Vec::with_capacity(context.work_packages.len());
        for package in &context.work_packages {
            let (base, buffer) = package_days(package, crew, context.available_hours, context.buffer_pct);
            let start = package
                .dependencies
                .iter()
                .filter_map(|d| finishes.get(d.as_str()).copied())
                .fold(0.0, f64::max);
            let finish = start + base + buffer;
            finishes.insert(package.name.as_str(), finish);
            packages.push(PackageSchedule {
                name: package.name.clone(),
                base_days: base,
                buffer_days: buffer,
                total_days: base + buffer,
                start_day: start,
                finish_day: finish,
                dependencies: package.dependencies.clone(),
            });
        }

        let total_days = packages.iter().map(|p| p.finish_day).fold(0.0, f64::max);
        let total_weeks = if context.working_days_per_week > 0 {
            total_days / f64::from(context.working_days_per_week)
        } else {
            0.0
        };
        let schedule_variance_pct = if context.duration_weeks > 0.0 {
            (total_weeks - context.duration_weeks) / context.duration_weeks * 100.0
        } else {
            0.0
        };

        Self {
            takt_time_hours: takt_time(context.available_hours, context.customer_demand),
            crew_size: crew,
            recommended_crew: recommended,
            size_risk: RiskLevel::from_project_size(context.size),
            packages,
            total_days,
            total_weeks,
            schedule_variance_pct,
        }
    }

    /// Whether the computed plan fits inside the project's duration
    pub fn fits_duration(&self) -> bool {
        self.schedule_variance_pct <= 0.0
    }
}
