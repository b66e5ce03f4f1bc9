//! TaktCouncil - multi-agent TAKT planning advisor
//!
//! A council of six advisory roles (strategy, workflow, scheduling, data
//! analysis, risk, implementation) reviews a construction project. Each role
//! is one stateless model call; later roles read the answers of the roles
//! they depend on. The orchestrator then cross-checks the reported estimates
//! against each other and against deterministic TAKT figures, and assembles
//! a `PlanningSession`.
//!
//! # Modules
//!
//! - [`domain`] - Project input, roles, responses and sessions
//! - [`takt`] - Deterministic takt time, crew and package scheduling
//! - [`llm`] - Model gateway trait with Anthropic and OpenAI-compatible clients
//! - [`prompts`] - Handlebars prompt templates per role
//! - [`agent`] - Role-driven advisory agent and estimate extraction
//! - [`orchestrator`] - Session sequencing, cross-checks and synthesis
//! - [`report`] - Dashboard, analysis, planning, reports and training views
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod report;
pub mod takt;
