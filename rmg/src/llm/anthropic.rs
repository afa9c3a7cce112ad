//! Anthropic Claude API client implementation
//!
//! Implements the LlmClient trait for Anthropic's Messages API. One call is
//! exactly one HTTP request: failures are classified and returned, never
//! retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{GenerationRequest, GenerationResponse, LlmClient, LlmError, ProviderErrorKind, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Messages API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude API client
pub struct AnthropicClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl AnthropicClient {
    /// Create a new client from configuration
    ///
    /// Resolves the API key from the environment variable or key file named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::MissingApiKey(e.to_string()))?;

        Self::new(api_key, config.base_url.clone(), Duration::from_millis(config.timeout_ms))
    }

    /// Create a client with an explicit key, base URL and transport timeout
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Build the request body for the Anthropic API
    fn build_request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        debug!(%request.model, %request.max_tokens, "build_request_body: called");
        serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": request.prompt,
                }
            ],
        })
    }

    /// Parse the Anthropic API response, keeping the first text block
    fn parse_response(&self, api_response: AnthropicResponse) -> Result<GenerationResponse, LlmError> {
        debug!(?api_response.stop_reason, blocks = api_response.content.len(), "parse_response: called");
        let text = api_response
            .content
            .into_iter()
            .find_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .ok_or_else(|| LlmError::InvalidResponse("Response contained no text content".to_string()))?;

        Ok(GenerationResponse {
            text,
            stop_reason: api_response
                .stop_reason
                .as_deref()
                .map(StopReason::from_anthropic)
                .unwrap_or(StopReason::EndTurn),
            usage: TokenUsage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
                cache_read_tokens: api_response.usage.cache_read_input_tokens.unwrap_or(0),
                cache_creation_tokens: api_response.usage.cache_creation_input_tokens.unwrap_or(0),
            },
        })
    }

    /// Turn a non-success response into a classified provider error
    fn provider_error(status: u16, body: &str, retry_after: Option<Duration>) -> LlmError {
        let (error_type, message) = match serde_json::from_str::<AnthropicErrorBody>(body) {
            Ok(parsed) => (Some(parsed.error.kind), parsed.error.message),
            Err(_) => {
                debug!(status, "provider_error: body is not a JSON error object");
                (None, body.trim().to_string())
            }
        };

        LlmError::Provider {
            status,
            kind: ProviderErrorKind::classify(status, error_type.as_deref()),
            message,
            retry_after,
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        debug!(%request.model, %request.max_tokens, prompt_len = request.prompt.len(), "complete: called");
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_request_body(&request);
        let started = Instant::now();

        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();

        if !response.status().is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            debug!(status, ?retry_after, "complete: API error");
            return Err(Self::provider_error(status, &text, retry_after));
        }

        let text = response.text().await?;
        let api_response: AnthropicResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to decode response body: {}", e)))?;

        let parsed = self.parse_response(api_response)?;
        debug!(
            duration_ms = started.elapsed().as_millis() as u64,
            stop_reason = %parsed.stop_reason,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            text_len = parsed.text.len(),
            "complete: success"
        );
        Ok(parsed)
    }
}

// Anthropic API response types

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
    cache_read_input_tokens: Option<u64>,
    cache_creation_input_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}
