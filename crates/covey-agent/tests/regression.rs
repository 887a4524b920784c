//! Regression tests for covey-agent: BackendConfig, LlmProvider, and the HTTP
//! backends against a mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use covey_agent::{BackendConfig, InferenceBackend, InferenceOptions, LlmClient, LlmProvider};
use covey_core::CoveyError;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai_ok(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "gen-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
}

// --- BackendConfig & LlmProvider ---

#[test]
fn test_backend_config_deserialization_with_defaults() {
    let toml_str = r#"
        provider = "openrouter"
    "#;

    let config: BackendConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.provider, LlmProvider::OpenRouter);
    assert!(config.api_key.is_empty());
    assert!(config.api_base_url.is_none());
    assert_eq!(config.base_url(), "https://openrouter.ai/api");
}

#[test]
fn test_llm_provider_rejects_unknown() {
    let parsed: Result<LlmProvider, _> = serde_json::from_str("\"bedrock\"");
    assert!(parsed.is_err());
}

// --- OpenAI-compatible backend ---

#[tokio::test]
async fn test_openai_backend_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "qwen/qwen3-8b:free",
            "max_tokens": 800
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_ok("Two layers, no cycles.")))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::new(
        BackendConfig::new(LlmProvider::OpenAi, "sk-test").with_base_url(server.uri()),
    );
    let completion = client
        .invoke(
            "Analyze the architecture",
            "qwen/qwen3-8b:free",
            &InferenceOptions::new(800, 0.3),
        )
        .await
        .unwrap();

    assert_eq!(completion.text, "Two layers, no cycles.");
    assert_eq!(completion.usage.total_tokens, 15);
}

#[tokio::test]
async fn test_openrouter_sends_attribution_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("X-Title", "Covey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_ok("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::new(
        BackendConfig::new(LlmProvider::OpenRouter, "sk-or").with_base_url(server.uri()),
    );
    let completion = client
        .invoke("ping", "google/gemini-flash-1.5:free", &InferenceOptions::default())
        .await
        .unwrap();
    assert_eq!(completion.text, "ok");
}

#[tokio::test]
async fn test_openai_backend_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let client =
        LlmClient::new(BackendConfig::new(LlmProvider::Groq, "k").with_base_url(server.uri()));
    let err = client
        .invoke("x", "llama-3.1-8b-instant", &InferenceOptions::default())
        .await
        .unwrap_err();

    match err {
        CoveyError::Http(msg) => {
            assert!(msg.contains("503"));
            assert!(msg.contains("upstream unavailable"));
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_backend_error_object_with_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": { "message": "No endpoints found for model", "code": 404 }
        })))
        .mount(&server)
        .await;

    let client =
        LlmClient::new(BackendConfig::new(LlmProvider::OpenRouter, "k").with_base_url(server.uri()));
    let err = client
        .invoke("x", "missing/model:free", &InferenceOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoveyError::Inference(ref m) if m.contains("No endpoints")));
}

#[tokio::test]
async fn test_openai_backend_non_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client =
        LlmClient::new(BackendConfig::new(LlmProvider::Local, "").with_base_url(server.uri()));
    let err = client
        .invoke("x", "llama3.2", &InferenceOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoveyError::MalformedResponse(_)));
}

// --- Claude backend ---

#[tokio::test]
async fn test_claude_backend_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": "No injection sinks found." }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 30, "output_tokens": 8 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        LlmClient::new(BackendConfig::new(LlmProvider::Claude, "sk-ant").with_base_url(server.uri()));
    let completion = client
        .invoke("Audit security", "claude-sonnet-4-20250514", &InferenceOptions::default())
        .await
        .unwrap();
    assert_eq!(completion.text, "No injection sinks found.");
    assert_eq!(completion.usage.total_tokens, 38);
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    // Port 9 (discard) is not expected to accept HTTP connections.
    let client = LlmClient::new(
        BackendConfig::new(LlmProvider::OpenAi, "k").with_base_url("http://127.0.0.1:9"),
    );
    let err = client
        .invoke("x", "gpt-4o-mini", &InferenceOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoveyError::Http(_)));
}
