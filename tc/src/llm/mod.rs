//! Model gateway for TaktCouncil
//!
//! One trait, [`LlmClient`], fronts every hosted text-generation provider.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod http;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::{ProviderKind, ResolvedLlmConfig};

/// Create an LLM client from a resolved configuration
///
/// The provider's `kind` decides the wire protocol; the provider name is
/// carried through for reporting.
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, kind = %config.kind, model = %config.model, "create_client: called");
    match config.kind {
        ProviderKind::Anthropic => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        ProviderKind::OpenAI => {
            debug!("create_client: creating OpenAI-compatible client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn resolved(kind: ProviderKind, env: &str) -> ResolvedLlmConfig {
        ResolvedLlmConfig {
            provider: "groq".to_string(),
            kind,
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: env.to_string(),
            base_url: "https://api.groq.com/openai/".to_string(),
            max_tokens: 1024,
            timeout_ms: 1000,
        }
    }

    #[test]
    #[serial]
    fn test_create_client_uses_provider_name() {
        unsafe { std::env::set_var("TC_TEST_GROQ_KEY", "gsk-test") };
        let client = create_client(&resolved(ProviderKind::OpenAI, "TC_TEST_GROQ_KEY")).unwrap();
        assert_eq!(client.provider(), "groq");
        assert_eq!(client.model(), "llama-3.3-70b-versatile");
        unsafe { std::env::remove_var("TC_TEST_GROQ_KEY") };
    }

    #[test]
    #[serial]
    fn test_create_client_missing_key() {
        unsafe { std::env::remove_var("TC_TEST_ABSENT_KEY") };
        let result = create_client(&resolved(ProviderKind::Anthropic, "TC_TEST_ABSENT_KEY"));
        assert!(matches!(result, Err(LlmError::Config(_))));
    }
}
