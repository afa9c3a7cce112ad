//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
///
/// Nothing in this crate retries on these; [`LlmError::is_retryable`] only
/// classifies so callers can decide.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request never produced an HTTP response
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("Provider error {status} ({kind}): {message}")]
    Provider {
        status: u16,
        kind: ProviderErrorKind,
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("LLM API key not found: {0}")]
    MissingApiKey(String),

    #[error("Unknown LLM provider: '{0}'. Supported: anthropic")]
    UnsupportedProvider(String),
}

/// Classification of a provider error response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Invalid or unauthorized API key
    Authentication,
    /// Too many requests or tokens per minute
    RateLimited,
    /// Unknown model or endpoint
    NotFound,
    /// Malformed request, including prompts over the context window
    InvalidRequest,
    /// Provider temporarily overloaded
    Overloaded,
    /// Provider-side failure
    Server,
    Other,
}

impl ProviderErrorKind {
    /// Classify from the provider's error `type` field, falling back to the status code
    pub fn classify(status: u16, error_type: Option<&str>) -> Self {
        match error_type {
            Some("authentication_error") | Some("permission_error") => Self::Authentication,
            Some("rate_limit_error") => Self::RateLimited,
            Some("not_found_error") => Self::NotFound,
            Some("invalid_request_error") | Some("request_too_large") => Self::InvalidRequest,
            Some("overloaded_error") => Self::Overloaded,
            Some("api_error") => Self::Server,
            _ => Self::from_status(status),
        }
    }

    fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            400 | 413 | 422 => Self::InvalidRequest,
            529 => Self::Overloaded,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Authentication => "authentication",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::InvalidRequest => "invalid_request",
            Self::Overloaded => "overloaded",
            Self::Server => "server",
            Self::Other => "other",
        };
        write!(f, "{}", name)
    }
}

impl LlmError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            LlmError::Provider {
                kind: ProviderErrorKind::RateLimited,
                ..
            }
        )
    }

    /// Check if this is an authentication error
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            LlmError::Provider {
                kind: ProviderErrorKind::Authentication,
                ..
            }
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport(_) => true,
            LlmError::Provider { kind, .. } => matches!(
                kind,
                ProviderErrorKind::RateLimited | ProviderErrorKind::Overloaded | ProviderErrorKind::Server
            ),
            LlmError::InvalidResponse(_) | LlmError::MissingApiKey(_) | LlmError::UnsupportedProvider(_) => false,
        }
    }

    /// Get the retry duration if the provider sent one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::Provider { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(status: u16, kind: ProviderErrorKind) -> LlmError {
        LlmError::Provider {
            status,
            kind,
            message: "boom".to_string(),
            retry_after: None,
        }
    }

    #[test]
    fn test_classify_by_error_type() {
        assert_eq!(
            ProviderErrorKind::classify(400, Some("authentication_error")),
            ProviderErrorKind::Authentication
        );
        assert_eq!(
            ProviderErrorKind::classify(400, Some("rate_limit_error")),
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            ProviderErrorKind::classify(400, Some("not_found_error")),
            ProviderErrorKind::NotFound
        );
        assert_eq!(
            ProviderErrorKind::classify(529, Some("overloaded_error")),
            ProviderErrorKind::Overloaded
        );
    }

    #[test]
    fn test_classify_falls_back_to_status() {
        assert_eq!(ProviderErrorKind::classify(401, None), ProviderErrorKind::Authentication);
        assert_eq!(ProviderErrorKind::classify(429, None), ProviderErrorKind::RateLimited);
        assert_eq!(ProviderErrorKind::classify(413, None), ProviderErrorKind::InvalidRequest);
        assert_eq!(ProviderErrorKind::classify(502, Some("weird")), ProviderErrorKind::Server);
        assert_eq!(ProviderErrorKind::classify(418, None), ProviderErrorKind::Other);
    }

    #[test]
    fn test_is_rate_limit() {
        assert!(provider(429, ProviderErrorKind::RateLimited).is_rate_limit());
        assert!(!provider(500, ProviderErrorKind::Server).is_rate_limit());
    }

    #[test]
    fn test_is_retryable() {
        assert!(provider(429, ProviderErrorKind::RateLimited).is_retryable());
        assert!(provider(500, ProviderErrorKind::Server).is_retryable());
        assert!(provider(529, ProviderErrorKind::Overloaded).is_retryable());

        // 4xx errors should not be retryable
        assert!(!provider(400, ProviderErrorKind::InvalidRequest).is_retryable());
        assert!(!provider(401, ProviderErrorKind::Authentication).is_retryable());

        assert!(!LlmError::InvalidResponse("Bad JSON".to_string()).is_retryable());
    }

    #[test]
    fn test_retry_after() {
        let err = LlmError::Provider {
            status: 429,
            kind: ProviderErrorKind::RateLimited,
            message: "slow down".to_string(),
            retry_after: Some(Duration::from_secs(42)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(provider(500, ProviderErrorKind::Server).retry_after(), None);
    }

    #[test]
    fn test_display() {
        let err = provider(401, ProviderErrorKind::Authentication);
        assert_eq!(err.to_string(), "Provider error 401 (authentication): boom");
        assert!(err.is_auth());
    }
}
