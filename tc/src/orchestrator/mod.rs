//! Orchestration of the advisory roles
//!
//! Validates the project, runs each role with its upstream outputs as
//! context, applies the failure policy, then cross-checks the estimates
//! and synthesizes a summary.

mod config;
mod crosscheck;
mod engine;
mod synthesis;

pub use config::{ExecutionMode, FailurePolicy, OrchestratorConfig};
pub use engine::{Orchestrator, OrchestratorError};
pub use crosscheck::{CrossCheckReport, Finding, FindingKind, cross_check, relative_difference_pct};
pub use synthesis::{SessionSummary, median, synthesize};
