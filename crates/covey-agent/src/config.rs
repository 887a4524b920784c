use serde::{Deserialize, Serialize};

/// Completion provider reached by [`crate::LlmClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic messages API.
    Claude,
    /// OpenAI chat completions API.
    OpenAi,
    /// OpenRouter, OpenAI-compatible; free `:free` models are routed here.
    OpenRouter,
    /// Groq cloud inference, OpenAI-compatible API.
    Groq,
    /// Any self-hosted OpenAI-compatible server (Ollama, vLLM, llama.cpp).
    Local,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Claude => write!(f, "claude"),
            LlmProvider::OpenAi => write!(f, "openai"),
            LlmProvider::OpenRouter => write!(f, "openrouter"),
            LlmProvider::Groq => write!(f, "groq"),
            LlmProvider::Local => write!(f, "local"),
        }
    }
}

/// Where and how to reach the inference service.
///
/// Model ids are not part of this config: every agent names its own model and
/// passes it per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub provider: LlmProvider,
    #[serde(default)]
    pub api_key: String,
    pub api_base_url: Option<String>,
}

impl BackendConfig {
    /// Config for `provider` with its default endpoint.
    pub fn new(provider: LlmProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            api_base_url: None,
        }
    }

    /// Override the provider's default endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url.trim_end_matches('/')
        } else {
            match self.provider {
                LlmProvider::Claude => "https://api.anthropic.com",
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::OpenRouter => "https://openrouter.ai/api",
                LlmProvider::Groq => "https://api.groq.com/openai",
                LlmProvider::Local => "http://localhost:11434",
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_urls() {
        assert_eq!(
            BackendConfig::new(LlmProvider::OpenRouter, "k").base_url(),
            "https://openrouter.ai/api"
        );
        assert_eq!(
            BackendConfig::new(LlmProvider::Claude, "k").base_url(),
            "https://api.anthropic.com"
        );
        assert_eq!(
            BackendConfig::new(LlmProvider::Local, "").base_url(),
            "http://localhost:11434"
        );
    }

    #[test]
    fn test_base_url_override_strips_trailing_slash() {
        let config =
            BackendConfig::new(LlmProvider::OpenAi, "k").with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_provider_display_matches_serde() {
        for provider in [
            LlmProvider::Claude,
            LlmProvider::OpenAi,
            LlmProvider::OpenRouter,
            LlmProvider::Groq,
            LlmProvider::Local,
        ] {
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{provider}\""));
        }
    }
}
