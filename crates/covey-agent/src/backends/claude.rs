use super::InferenceBackend;
use crate::config::BackendConfig;
use crate::llm::{Completion, InferenceOptions, Usage};
use async_trait::async_trait;
use covey_core::{CoveyError, CoveyResult};
use tracing::debug;

/// Claude (Anthropic) API backend.
pub struct ClaudeBackend {
    config: BackendConfig,
    http: reqwest::Client,
}

impl ClaudeBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl InferenceBackend for ClaudeBackend {
    async fn invoke(
        &self,
        prompt: &str,
        model_id: &str,
        options: &InferenceOptions,
    ) -> CoveyResult<Completion> {
        let url = format!("{}/v1/messages", self.config.base_url());

        let body = serde_json::json!({
            "model": model_id,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        debug!(model = model_id, "Sending Claude messages request");

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CoveyError::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CoveyError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(CoveyError::Http(format!("Claude API error {status}: {text}")));
        }

        let resp_body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| CoveyError::MalformedResponse(format!("invalid JSON body: {e}")))?;

        parse_claude_completion(&resp_body)
    }
}

/// Join the text blocks of a messages API response.
pub fn parse_claude_completion(body: &serde_json::Value) -> CoveyResult<Completion> {
    if body["type"] == "error" {
        let message = body["error"]["message"].as_str().unwrap_or("unknown error");
        return Err(CoveyError::Inference(message.to_string()));
    }

    let content = body["content"]
        .as_array()
        .ok_or_else(|| CoveyError::MalformedResponse("missing content in Claude response".into()))?;

    let text = content
        .iter()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let usage = Usage::new(
        body["usage"]["input_tokens"].as_u64().unwrap_or(0),
        body["usage"]["output_tokens"].as_u64().unwrap_or(0),
    );

    Ok(Completion::new(text, usage))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_blocks() {
        let body = serde_json::json!({
            "type": "message",
            "content": [
                { "type": "text", "text": "First finding." },
                { "type": "text", "text": "Second finding." }
            ],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 50, "output_tokens": 12 }
        });
        let completion = parse_claude_completion(&body).unwrap();
        assert_eq!(completion.text, "First finding.\nSecond finding.");
        assert_eq!(completion.usage.total_tokens, 62);
    }

    #[test]
    fn test_parse_error_body() {
        let body = serde_json::json!({
            "type": "error",
            "error": { "type": "overloaded_error", "message": "Overloaded" }
        });
        let err = parse_claude_completion(&body).unwrap_err();
        assert!(matches!(err, CoveyError::Inference(ref m) if m == "Overloaded"));
    }

    #[test]
    fn test_parse_missing_content() {
        let err = parse_claude_completion(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, CoveyError::MalformedResponse(_)));
    }
}
