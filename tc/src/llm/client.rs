//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless model gateway - each call is independent
///
/// This is the uniform call contract every hosted provider is reached
/// through. Agents never hold conversation state between calls; upstream
/// context is rendered into the prompt instead.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name as configured (e.g. "anthropic", "groq")
    fn provider(&self) -> &str;

    /// Model identifier sent to the provider
    fn model(&self) -> &str;

    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
