//! `covey.toml` loading.
//!
//! Every section is optional: a missing file or an empty one yields the six
//! default agents on OpenRouter with default swarm tuning.

use covey_agent::{BackendConfig, LlmProvider};
use covey_core::{CoveyError, CoveyResult};
use covey_orchestrator::{AgentProfile, AgentRegistry, SwarmConfig};
use serde::Deserialize;
use std::path::Path;

/// Full CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoveyConfig {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub swarm: SwarmConfig,
    /// Replaces the default agents when non-empty.
    #[serde(default)]
    pub agents: Vec<AgentProfile>,
}

/// `[backend]` table. The API key is either inline or read from an
/// environment variable.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    #[serde(default = "default_provider")]
    pub provider: LlmProvider,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Defaults to the provider's conventional variable.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

fn default_provider() -> LlmProvider {
    LlmProvider::OpenRouter
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            api_key_env: None,
            api_base_url: None,
        }
    }
}

impl BackendSection {
    /// Environment variable consulted for the API key.
    pub fn key_env(&self) -> &str {
        if let Some(var) = self.api_key_env.as_deref() {
            return var;
        }
        match self.provider {
            LlmProvider::Claude => "ANTHROPIC_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::Local => "LOCAL_API_KEY",
        }
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> CoveyResult<BackendConfig> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Resolve using `lookup` for environment variables. Only a local
    /// backend may run without a key.
    pub fn resolve_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> CoveyResult<BackendConfig> {
        let key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup(self.key_env()).filter(|k| !k.trim().is_empty()));

        let key = match (key, self.provider) {
            (Some(key), _) => key,
            (None, LlmProvider::Local) => String::new(),
            (None, provider) => {
                return Err(CoveyError::Config(format!(
                    "no API key for {provider}: set {} or backend.api_key",
                    self.key_env()
                )))
            }
        };

        let mut config = BackendConfig::new(self.provider, key);
        if let Some(url) = &self.api_base_url {
            config = config.with_base_url(url.clone());
        }
        Ok(config)
    }
}

impl CoveyConfig {
    /// Configured agents, or the defaults when none are listed.
    pub fn registry(&self) -> CoveyResult<AgentRegistry> {
        if self.agents.is_empty() {
            Ok(AgentRegistry::with_defaults())
        } else {
            AgentRegistry::from_profiles(self.agents.iter().cloned())
        }
    }
}

/// Read and parse a config file. A missing file means all defaults.
pub fn load_config(path: &Path) -> CoveyResult<CoveyConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(CoveyConfig::default());
    }
    parse_config(path)
}

/// Read and parse a TOML config file.
pub fn parse_config(path: &Path) -> CoveyResult<CoveyConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CoveyError::Config(format!("Failed to read config '{}': {}", path.display(), e))
    })?;
    let config: CoveyConfig = toml::from_str(&content).map_err(|e| {
        CoveyError::Config(format!("Failed to parse config '{}': {}", path.display(), e))
    })?;
    config.swarm.validate()?;
    Ok(config)
}
