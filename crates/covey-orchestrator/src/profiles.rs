use crate::types::{AgentProfile, AnalysisKind, ModelSpec};

/// The six default analysis agents, one per [`AnalysisKind`], each backed by
/// a different free OpenRouter model.
pub fn default_profiles() -> Vec<AgentProfile> {
    vec![
        architecture_profile(),
        security_profile(),
        performance_profile(),
        quality_profile(),
        testing_profile(),
        documentation_profile(),
    ]
}

/// Default model for the coordinator's synthesis call.
pub fn default_coordinator_model() -> ModelSpec {
    ModelSpec::new("google/gemini-flash-1.5:free", 2000, 0.3)
}

fn architecture_profile() -> AgentProfile {
    AgentProfile::new(
        "architecture_analyst",
        [AnalysisKind::Architecture],
        ModelSpec::new("google/gemini-flash-1.5:free", 1500, 0.3),
    )
    .with_name("Architecture Analyst")
    .with_description("Structure, layering and coupling")
}

fn security_profile() -> AgentProfile {
    AgentProfile::new(
        "security_auditor",
        [AnalysisKind::Security],
        ModelSpec::new("qwen/qwen3-8b:free", 1500, 0.2),
    )
    .with_name("Security Auditor")
    .with_description("Vulnerabilities, secrets and input handling")
}

fn performance_profile() -> AgentProfile {
    AgentProfile::new(
        "performance_engineer",
        [AnalysisKind::Performance],
        ModelSpec::new("z-ai/glm-4.5-air:free", 1200, 0.3),
    )
    .with_name("Performance Engineer")
    .with_description("Hot paths, allocation and I/O")
}

fn quality_profile() -> AgentProfile {
    AgentProfile::new(
        "code_quality_reviewer",
        [AnalysisKind::Quality],
        ModelSpec::new("openai/gpt-oss-20b:free", 1200, 0.3),
    )
    .with_name("Code Quality Reviewer")
    .with_description("Readability, duplication and error handling")
}

fn testing_profile() -> AgentProfile {
    AgentProfile::new(
        "test_strategist",
        [AnalysisKind::Testing],
        ModelSpec::new("microsoft/phi-3-mini-128k-instruct:free", 1000, 0.4),
    )
    .with_name("Test Strategist")
    .with_description("Coverage gaps and test strategy")
}

fn documentation_profile() -> AgentProfile {
    AgentProfile::new(
        "documentation_writer",
        [AnalysisKind::Documentation],
        ModelSpec::new("meta-llama/llama-3.2-3b-instruct:free", 1000, 0.5),
    )
    .with_name("Documentation Writer")
    .with_description("READMEs, API docs and onboarding")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_profiles_cover_every_kind_once() {
        let profiles = default_profiles();
        assert_eq!(profiles.len(), 6);
        for kind in AnalysisKind::ALL {
            let capable = profiles.iter().filter(|p| p.can_handle(kind)).count();
            assert_eq!(capable, 1, "{kind} should have exactly one default agent");
        }
    }

    #[test]
    fn test_default_profile_ids_unique() {
        let profiles = default_profiles();
        let ids: HashSet<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), profiles.len());
    }

    #[test]
    fn test_default_profiles_use_distinct_models() {
        let profiles = default_profiles();
        let models: HashSet<&str> = profiles.iter().map(|p| p.model.model_id.as_str()).collect();
        assert_eq!(models.len(), profiles.len());
        assert!(models.iter().all(|m| m.ends_with(":free")));
    }

    #[test]
    fn test_security_runs_cooler_than_documentation() {
        let profiles = default_profiles();
        let temp = |id: &str| {
            profiles
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.model.temperature)
                .unwrap()
        };
        assert!(temp("security_auditor") < temp("documentation_writer"));
    }
}
