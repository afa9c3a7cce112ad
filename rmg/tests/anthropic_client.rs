//! HTTP behaviour of the Anthropic gateway against a mock server

use std::sync::Arc;
use std::time::Duration;

use roadmapgen::llm::{AnthropicClient, GenerationRequest, LlmClient, LlmError, ProviderErrorKind, StopReason};
use roadmapgen::roadmap::{GenerationSettings, RoadmapGenerator};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> AnthropicClient {
    AnthropicClient::new("test-key", server.uri(), Duration::from_secs(5)).expect("client builds")
}

fn request(prompt: &str) -> GenerationRequest {
    GenerationRequest::new(prompt, "claude-3-7-sonnet-20250219", 10_000)
}

fn message(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_123",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
        "model": "claude-3-7-sonnet-20250219",
        "stop_reason": "end_turn",
        "usage": { "input_tokens": 120, "output_tokens": 40 }
    })
}

fn error_body(kind: &str, msg: &str) -> serde_json::Value {
    json!({ "type": "error", "error": { "type": kind, "message": msg } })
}

#[tokio::test]
async fn test_success_extracts_text_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-7-sonnet-20250219",
            "max_tokens": 10000,
            "messages": [{ "role": "user", "content": "Plan my app" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("# Roadmap")))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server).complete(request("Plan my app")).await.unwrap();

    assert_eq!(response.text, "# Roadmap");
    assert_eq!(response.stop_reason, StopReason::EndTurn);
    assert_eq!(response.usage.input_tokens, 120);
    assert_eq!(response.usage.output_tokens, 40);
}

#[tokio::test]
async fn test_skips_non_text_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "type": "thinking", "thinking": "hmm", "signature": "x" },
                { "type": "text", "text": "answer" }
            ],
            "stop_reason": "max_tokens",
            "usage": { "input_tokens": 1, "output_tokens": 2 }
        })))
        .mount(&server)
        .await;

    let response = client(&server).complete(request("p")).await.unwrap();
    assert_eq!(response.text, "answer");
    assert_eq!(response.stop_reason, StopReason::MaxTokens);
}

#[tokio::test]
async fn test_401_is_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(error_body("authentication_error", "invalid x-api-key")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).complete(request("p")).await.unwrap_err();

    assert!(err.is_auth());
    assert!(!err.is_retryable());
    match err {
        LlmError::Provider { status, kind, message, .. } => {
            assert_eq!(status, 401);
            assert_eq!(kind, ProviderErrorKind::Authentication);
            assert_eq!(message, "invalid x-api-key");
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_429_captures_retry_after_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "17")
                .set_body_json(error_body("rate_limit_error", "slow down")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).complete(request("p")).await.unwrap_err();

    assert!(err.is_rate_limit());
    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(17)));
    // MockServer verifies `.expect(1)` on drop
}

#[tokio::test]
async fn test_400_is_invalid_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(error_body("invalid_request_error", "prompt is too long")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).complete(request("p")).await.unwrap_err();

    assert!(matches!(
        err,
        LlmError::Provider {
            status: 400,
            kind: ProviderErrorKind::InvalidRequest,
            ..
        }
    ));
    assert!(err.to_string().contains("prompt is too long"));
}

#[tokio::test]
async fn test_5xx_with_plain_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).complete(request("p")).await.unwrap_err();

    assert!(matches!(err, LlmError::Provider { kind: ProviderErrorKind::Server, .. }));
    assert_eq!(err.retry_after(), None);
}

#[tokio::test]
async fn test_undecodable_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client(&server).complete(request("p")).await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = AnthropicClient::new("test-key", format!("http://{}", addr), Duration::from_secs(2)).unwrap();

    let err = client.complete(request("p")).await.unwrap_err();

    assert!(matches!(err, LlmError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_timeout_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(message("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    let client = AnthropicClient::new("test-key", server.uri(), Duration::from_millis(200)).unwrap();

    let err = client.complete(request("p")).await.unwrap_err();

    match err {
        LlmError::Transport(e) => assert!(e.is_timeout()),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generator_end_to_end_over_http() {
    let server = MockServer::start().await;
    // Reflection request: carries the draft back to the model
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains("DRAFT_TEXT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("FINAL_TEXT")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_string_contains("a todo list app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("DRAFT_TEXT")))
        .expect(1)
        .mount(&server)
        .await;

    let generator = RoadmapGenerator::new(
        Arc::new(client(&server)),
        GenerationSettings::new("claude-3-7-sonnet-20250219", 10_000),
    );

    let roadmap = generator.generate_roadmap("a todo list app").await.unwrap();
    assert_eq!(roadmap, "FINAL_TEXT");
}
