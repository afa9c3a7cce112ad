//! LLM request/response types
//!
//! A generation is a single user prompt in, a single text out. Nothing here
//! models conversations or tools: every call starts from a fresh context.

use tracing::debug;

/// A generation request - everything needed for one LLM call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Fully rendered prompt, sent as the single user message
    pub prompt: String,

    /// Model identifier
    pub model: String,

    /// Max tokens for the response
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens,
        }
    }
}

/// Response from a generation request
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Text of the first content block
    pub text: String,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage for cost tracking
    pub usage: TokenUsage,
}

impl GenerationResponse {
    /// Plain text response with no usage data (mocks and tests)
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

impl StopReason {
    /// Parse from Anthropic API stop_reason string
    pub fn from_anthropic(s: &str) -> Self {
        debug!(%s, "StopReason::from_anthropic: called");
        match s {
            "end_turn" => StopReason::EndTurn,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            _ => {
                debug!("StopReason::from_anthropic: unknown, defaulting to EndTurn");
                StopReason::EndTurn
            }
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::StopSequence => write!(f, "stop_sequence"),
        }
    }
}

/// Token usage for cost tracking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
}

impl TokenUsage {
    /// Calculate cost in USD based on model pricing
    pub fn cost_usd(&self, model: &str) -> f64 {
        debug!(%model, %self.input_tokens, %self.output_tokens, "TokenUsage::cost_usd: called");
        let (input_price, output_price) = match model {
            m if m.contains("opus") => (15.0, 75.0),
            m if m.contains("sonnet") => (3.0, 15.0),
            m if m.contains("haiku") => (0.25, 1.25),
            _ => {
                debug!("TokenUsage::cost_usd: unknown model, defaulting to sonnet pricing");
                (3.0, 15.0)
            }
        };

        let input_cost = (self.input_tokens as f64 / 1_000_000.0) * input_price;
        let output_cost = (self.output_tokens as f64 / 1_000_000.0) * output_price;

        // Cache reads are 90% cheaper
        let cache_cost = (self.cache_read_tokens as f64 / 1_000_000.0) * input_price * 0.1;

        input_cost + output_cost + cache_cost
    }
}
