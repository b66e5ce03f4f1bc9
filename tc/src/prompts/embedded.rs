//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Shared system prompt: persona framing and the marker-line contract
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

pub const STRATEGY: &str = include_str!("../../prompts/strategy.pmt");
pub const WORKFLOW: &str = include_str!("../../prompts/workflow.pmt");
pub const SCHEDULING: &str = include_str!("../../prompts/scheduling.pmt");
pub const DATA_ANALYST: &str = include_str!("../../prompts/data-analyst.pmt");
pub const RISK: &str = include_str!("../../prompts/risk.pmt");
pub const IMPLEMENTATION: &str = include_str!("../../prompts/implementation.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "strategy" => Some(STRATEGY),
        "workflow" => Some(WORKFLOW),
        "scheduling" => Some(SCHEDULING),
        "data-analyst" => Some(DATA_ANALYST),
        "risk" => Some(RISK),
        "implementation" => Some(IMPLEMENTATION),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
