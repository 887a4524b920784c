use super::InferenceBackend;
use crate::config::{BackendConfig, LlmProvider};
use crate::llm::{Completion, InferenceOptions, Usage};
use async_trait::async_trait;
use covey_core::{CoveyError, CoveyResult};
use tracing::debug;

/// OpenAI-compatible API backend.
///
/// Works with OpenAI, OpenRouter, Groq, Ollama, and any other provider
/// that implements the OpenAI chat completions API.
pub struct OpenAiBackend {
    config: BackendConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn build_body(
        &self,
        prompt: &str,
        model_id: &str,
        options: &InferenceOptions,
    ) -> serde_json::Value {
        serde_json::json!({
            "model": model_id,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        })
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Content-Type", "application/json");

        let request = if self.config.api_key.is_empty() {
            request
        } else {
            request.header("Authorization", format!("Bearer {}", self.config.api_key))
        };

        // OpenRouter attribution headers
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request
                .header("HTTP-Referer", "https://github.com/covey-rs/covey")
                .header("X-Title", "Covey")
        } else {
            request
        }
    }
}

#[async_trait]
impl InferenceBackend for OpenAiBackend {
    async fn invoke(
        &self,
        prompt: &str,
        model_id: &str,
        options: &InferenceOptions,
    ) -> CoveyResult<Completion> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());
        let body = self.build_body(prompt, model_id, options);

        debug!(provider = %self.config.provider, model = model_id, "Sending completion request");

        let resp = self
            .add_provider_headers(self.http.post(&url))
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
            return Err(CoveyError::Http(format!(
                "{} API error {}: {}",
                self.config.provider, status, text
            )));
        }

        let resp_body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| CoveyError::MalformedResponse(format!("invalid JSON body: {e}")))?;

        parse_openai_completion(&resp_body)
    }
}

/// Extract the completion text and usage from a chat completions body.
///
/// Some gateways (OpenRouter in particular) answer 200 with an `error` object
/// instead of `choices`; that is reported as an inference error.
pub fn parse_openai_completion(body: &serde_json::Value) -> CoveyResult<Completion> {
    if let Some(err) = body.get("error") {
        let message = err["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(CoveyError::Inference(message));
    }

    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            CoveyError::MalformedResponse("missing choices[0].message.content".into())
        })?;

    let usage = &body["usage"];
    let prompt_tokens = usage["prompt_tokens"].as_u64().unwrap_or(0);
    let completion_tokens = usage["completion_tokens"].as_u64().unwrap_or(0);
    let mut usage = Usage::new(prompt_tokens, completion_tokens);
    if let Some(total) = body["usage"]["total_tokens"].as_u64() {
        usage.total_tokens = total;
    }

    Ok(Completion::new(content, usage))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_with_usage() {
        let body = serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": "Layered architecture, 3 cycles." },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 200, "completion_tokens": 40, "total_tokens": 240 }
        });
        let completion = parse_openai_completion(&body).unwrap();
        assert_eq!(completion.text, "Layered architecture, 3 cycles.");
        assert_eq!(completion.usage.prompt_tokens, 200);
        assert_eq!(completion.usage.total_tokens, 240);
    }

    #[test]
    fn test_parse_completion_without_usage() {
        let body = serde_json::json!({
            "choices": [{ "message": { "content": "ok" } }]
        });
        let completion = parse_openai_completion(&body).unwrap();
        assert_eq!(completion.usage, Usage::default());
    }

    #[test]
    fn test_parse_error_object() {
        let body = serde_json::json!({
            "error": { "message": "Rate limit exceeded: free-models-per-day", "code": 429 }
        });
        let err = parse_openai_completion(&body).unwrap_err();
        assert!(matches!(err, CoveyError::Inference(ref m) if m.contains("Rate limit")));
    }

    #[test]
    fn test_parse_missing_content() {
        let body = serde_json::json!({ "choices": [] });
        let err = parse_openai_completion(&body).unwrap_err();
        assert!(matches!(err, CoveyError::MalformedResponse(_)));
    }

    #[test]
    fn test_build_body_single_user_message() {
        let backend = OpenAiBackend::new(BackendConfig::new(LlmProvider::OpenRouter, "k"));
        let body = backend.build_body("analyze", "qwen/qwen3-8b:free", &InferenceOptions::new(512, 0.2));
        assert_eq!(body["model"], "qwen/qwen3-8b:free");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "analyze");
    }
}
