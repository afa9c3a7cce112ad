//! LLM client module
//!
//! The gateway to the model provider: one prompt in, one text out.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::{LlmError, ProviderErrorKind};
pub use types::{GenerationRequest, GenerationResponse, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Provider names accepted by [`create_client`]
pub const SUPPORTED_PROVIDERS: &[&str] = &["anthropic"];

/// Create an LLM client based on the provider specified in config
///
/// Only "anthropic" is supported.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::UnsupportedProvider(other.to_string()))
        }
    }
}
