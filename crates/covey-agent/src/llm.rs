use crate::backends::claude::ClaudeBackend;
use crate::backends::openai::OpenAiBackend;
use crate::backends::InferenceBackend;
use crate::config::{BackendConfig, LlmProvider};
use async_trait::async_trait;
use covey_core::CoveyResult;
use serde::{Deserialize, Serialize};

/// Sampling options sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceOptions {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl InferenceOptions {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// Token accounting reported by the provider. Zero when the provider omits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A finished completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    #[serde(default)]
    pub usage: Usage,
}

impl Completion {
    pub fn new(text: impl Into<String>, usage: Usage) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }
}

/// Inference client that dispatches to the correct provider backend.
///
/// To add a new provider: implement [`InferenceBackend`] in `backends/` and
/// wire it here.
pub struct LlmClient {
    backend: Box<dyn InferenceBackend>,
}

impl LlmClient {
    pub fn new(config: BackendConfig) -> Self {
        let backend: Box<dyn InferenceBackend> = match config.provider {
            LlmProvider::Claude => Box::new(ClaudeBackend::new(config)),
            LlmProvider::OpenAi
            | LlmProvider::OpenRouter
            | LlmProvider::Groq
            | LlmProvider::Local => Box::new(OpenAiBackend::new(config)),
        };
        Self { backend }
    }

    /// Create from a pre-built backend (for custom/external providers).
    pub fn from_backend(backend: Box<dyn InferenceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl InferenceBackend for LlmClient {
    async fn invoke(
        &self,
        prompt: &str,
        model_id: &str,
        options: &InferenceOptions,
    ) -> CoveyResult<Completion> {
        self.backend.invoke(prompt, model_id, options).await
    }
}
