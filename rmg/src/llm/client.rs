//! LlmClient trait definition

use async_trait::async_trait;

use super::{GenerationRequest, GenerationResponse, LlmError};

/// Stateless LLM client - each call is independent (fresh context)
///
/// This is the gateway to the model provider. One call is one request: no
/// retries, no conversation state. Dropping the returned future aborts the
/// in-flight request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single generation request and wait for the full response
    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}
