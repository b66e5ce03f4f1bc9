//! Domain types for TaktCouncil
//!
//! - `ProjectContext` / `WorkPackage`: the planning input
//! - `AgentRole`: the six advisory roles
//! - `AgentRequest` / `AgentResponse` / `RoleOutcome` / `PlanningSession`

mod estimates;
mod id;
mod project;
mod role;
mod session;

pub use estimates::{Estimates, RiskLevel};
pub use id::{generate_id, slugify};
pub use project::{ContextError, ProjectContext, WorkPackage, parse_roles};
pub use role::AgentRole;
pub use session::{AgentRequest, AgentResponse, GenerationMeta, PlanningSession, RoleOutcome};

#[cfg(test)]
pub(crate) use project::fixtures;
