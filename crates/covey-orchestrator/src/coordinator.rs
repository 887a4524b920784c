use crate::prompts::synthesis_prompt;
use crate::types::{
    AnalysisKind, Confidence, ModelSpec, RiskLevel, SynthesizedResult, Task, TaskResult, WorkItem,
};
use covey_agent::InferenceBackend;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Turns a run's task results into one [`SynthesizedResult`].
///
/// Confidence depends only on the number of successful tasks. With zero
/// successes no synthesis call is made. A failed synthesis call degrades to
/// the raw outputs instead of failing the run.
pub struct ResultCoordinator {
    backend: Arc<dyn InferenceBackend>,
    model: ModelSpec,
    top_recommendations: usize,
    timeout: Duration,
}

impl ResultCoordinator {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        model: ModelSpec,
        top_recommendations: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            model,
            top_recommendations,
            timeout,
        }
    }

    /// Coordinate a complete result set. `tasks` is the run's task list;
    /// every task is expected to have an entry in `results`.
    pub async fn coordinate(
        &self,
        work_item: &WorkItem,
        tasks: &[Task],
        results: &HashMap<Uuid, TaskResult>,
    ) -> SynthesizedResult {
        let mut ordered: Vec<&Task> = tasks.iter().collect();
        ordered.sort_by_key(|t| (t.kind, t.sequence));

        let mut outputs: Vec<(AnalysisKind, &str)> = Vec::new();
        let mut failed_kinds = Vec::new();
        for task in ordered {
            match results.get(&task.id) {
                Some(TaskResult {
                    success: true,
                    output: Some(output),
                    ..
                }) => outputs.push((task.kind, output.as_str())),
                _ => failed_kinds.push(task.kind),
            }
        }

        let total = tasks.len();
        let successes = outputs.len();
        let confidence = Confidence::from_successes(successes);
        let mut result = SynthesizedResult {
            confidence,
            summary: String::new(),
            recommendations: Vec::new(),
            risk_level: None,
            confidence_statement: None,
            narrative: String::new(),
            synthesis_failed: false,
            note: None,
            successful_tasks: successes,
            total_tasks: total,
            failed_kinds,
            synthesis_tokens: 0,
        };

        if successes == 0 {
            warn!(total, "No successful tasks, skipping synthesis");
            result.summary = format!("No analysis succeeded (0 of {total} tasks)");
            result.note = Some("nothing to synthesize".to_string());
            return result;
        }

        let combined = combine_outputs(&outputs);
        let prompt = synthesis_prompt(
            work_item,
            &combined,
            self.top_recommendations,
            successes,
            total,
        );

        let outcome = tokio::time::timeout(
            self.timeout,
            self.backend
                .invoke(&prompt, &self.model.model_id, &self.model.options()),
        )
        .await;

        let failure = match outcome {
            Ok(Ok(completion)) if !completion.text.trim().is_empty() => {
                let parsed = parse_synthesis(&completion.text, self.top_recommendations);
                info!(
                    successes,
                    total,
                    confidence = %confidence,
                    recommendations = parsed.recommendations.len(),
                    "Synthesis complete"
                );
                result.summary = parsed.summary;
                result.recommendations = parsed.recommendations;
                result.risk_level = parsed.risk_level;
                result.confidence_statement = parsed.confidence_statement;
                result.narrative = completion.text;
                result.synthesis_tokens = completion.usage.total_tokens;
                return result;
            }
            Ok(Ok(_)) => "empty synthesis response".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("synthesis timed out after {}s", self.timeout.as_secs()),
        };

        warn!(error = %failure, "Synthesis failed, returning raw outputs");
        result.synthesis_failed = true;
        result.summary = format!(
            "Synthesis unavailable; raw output of {successes} of {total} tasks attached"
        );
        result.narrative = combined;
        result.note = Some(format!("synthesis failed: {failure}"));
        result
    }
}

/// Label each output with its kind, in the given order.
fn combine_outputs(outputs: &[(AnalysisKind, &str)]) -> String {
    let mut combined = String::new();
    for (kind, output) in outputs {
        combined.push_str(&format!(
            "## {}\n{}\n\n",
            kind.to_string().to_uppercase(),
            output.trim()
        ));
    }
    combined
}

/// Fields pulled out of a free-text synthesis response.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedSynthesis {
    pub summary: String,
    pub recommendations: Vec<String>,
    pub risk_level: Option<RiskLevel>,
    pub confidence_statement: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Summary,
    Recommendations,
    Risk,
    Confidence,
}

/// Parse a synthesis response leniently.
///
/// Recognizes the section headers the synthesis prompt asks for, tolerating
/// markdown decoration and inline content after the colon. Without a summary
/// section the first paragraph is used.
pub fn parse_synthesis(text: &str, top_recommendations: usize) -> ParsedSynthesis {
    let mut sections = Sections::default();
    let mut current = Section::Preamble;

    for line in text.lines() {
        match section_header(line) {
            Some((header, inline)) => {
                current = header;
                sections.push(current, inline);
            }
            None => sections.push(current, line),
        }
    }

    let summary = if sections.summary.is_empty() {
        first_paragraph(&sections.preamble)
    } else {
        sections.summary.join(" ")
    };
    let mut recommendations = sections.recommendations;
    recommendations.truncate(top_recommendations);

    ParsedSynthesis {
        summary,
        recommendations,
        risk_level: RiskLevel::from_text(&sections.risk.join(" ")),
        confidence_statement: Some(sections.confidence.join(" ")).filter(|s| !s.is_empty()),
    }
}

#[derive(Default)]
struct Sections<'a> {
    preamble: Vec<&'a str>,
    summary: Vec<&'a str>,
    risk: Vec<&'a str>,
    confidence: Vec<&'a str>,
    recommendations: Vec<String>,
}

impl<'a> Sections<'a> {
    fn push(&mut self, section: Section, line: &'a str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if section == Section::Preamble {
                self.preamble.push(trimmed);
            }
            return;
        }
        match section {
            Section::Preamble => self.preamble.push(trimmed),
            Section::Summary => self.summary.push(trimmed),
            Section::Risk => self.risk.push(trimmed),
            Section::Confidence => self.confidence.push(trimmed),
            Section::Recommendations => match strip_list_marker(trimmed) {
                Some("") => {}
                Some(item) => self.recommendations.push(item.to_string()),
                // Continuation of the previous item.
                None => match self.recommendations.last_mut() {
                    Some(last) => {
                        last.push(' ');
                        last.push_str(trimmed);
                    }
                    None => self.recommendations.push(trimmed.to_string()),
                },
            },
        }
    }
}

/// Recognize a section header line, returning any content after its colon.
fn section_header(line: &str) -> Option<(Section, &str)> {
    let cleaned = line.trim().trim_start_matches('#').trim().trim_matches('*').trim();
    let (head, rest) = cleaned.split_once(':').unwrap_or((cleaned, ""));
    let section = match head.trim().trim_matches('*').trim().to_ascii_lowercase().as_str() {
        "executive summary" | "summary" => Section::Summary,
        "recommendations" | "top recommendations" | "key recommendations" => {
            Section::Recommendations
        }
        "risk level" | "risk" | "overall risk" | "overall risk level" => Section::Risk,
        "confidence" | "confidence level" | "confidence statement" => Section::Confidence,
        _ => return None,
    };
    Some((section, rest.trim().trim_matches('*').trim()))
}

/// `- x`, `* x`, `1. x`, `2) x` → `x`.
fn strip_list_marker(line: &str) -> Option<&str> {
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return Some(rest.trim());
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))
        .map(str::trim)
}

fn first_paragraph(lines: &[&str]) -> String {
    lines
        .iter()
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use covey_agent::{Completion, InferenceOptions, Usage};
    use covey_core::{CoveyError, CoveyResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SYNTHESIS: &str = "\
## EXECUTIVE SUMMARY:
The service is well layered but leaks secrets in config.

**RECOMMENDATIONS:**
1. Move API keys to the environment
2) Add integration tests for the auth flow
   covering token expiry
- Split the 2k-line handler module
* Document the deploy process
5. Cache repository metadata
6. Rename util.rs

RISK LEVEL: **High** because of exposed credentials
CONFIDENCE: Medium, two reports were missing.
";

    struct FixedBackend {
        reply: CoveyResult<String>,
        calls: AtomicUsize,
    }

    impl FixedBackend {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(CoveyError::Http("429 rate limited".into())),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl InferenceBackend for FixedBackend {
        async fn invoke(
            &self,
            _prompt: &str,
            _model_id: &str,
            _options: &InferenceOptions,
        ) -> CoveyResult<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(Completion::new(text.clone(), Usage::new(50, 20))),
                Err(e) => Err(CoveyError::Http(e.to_string())),
            }
        }
    }

    fn coordinator(backend: Arc<FixedBackend>) -> ResultCoordinator {
        ResultCoordinator::new(
            backend,
            ModelSpec::new("coordinator", 2000, 0.3),
            5,
            Duration::from_secs(30),
        )
    }

    fn run(outcomes: &[(AnalysisKind, bool)]) -> (Vec<Task>, HashMap<Uuid, TaskResult>) {
        let item = WorkItem::new("acme/api", "review");
        let mut tasks = Vec::new();
        let mut results = HashMap::new();
        for (i, (kind, ok)) in outcomes.iter().enumerate() {
            let task = Task::new("agent", *kind, item.clone(), i);
            let result = if *ok {
                TaskResult::succeeded(&task, format!("{kind} findings"), Usage::default(), 10)
            } else {
                TaskResult::failed(&task, crate::types::TaskErrorKind::Timeout, "slow", 10)
            };
            results.insert(task.id, result);
            tasks.push(task);
        }
        (tasks, results)
    }

    #[test]
    fn test_parse_synthesis_sections() {
        let parsed = parse_synthesis(SYNTHESIS, 5);
        assert_eq!(
            parsed.summary,
            "The service is well layered but leaks secrets in config."
        );
        assert_eq!(parsed.recommendations.len(), 5);
        assert_eq!(parsed.recommendations[0], "Move API keys to the environment");
        assert_eq!(
            parsed.recommendations[1],
            "Add integration tests for the auth flow covering token expiry"
        );
        assert_eq!(parsed.recommendations[2], "Split the 2k-line handler module");
        assert_eq!(parsed.risk_level, Some(RiskLevel::High));
        assert_eq!(
            parsed.confidence_statement.as_deref(),
            Some("Medium, two reports were missing.")
        );
    }

    #[test]
    fn test_parse_synthesis_unstructured() {
        let parsed = parse_synthesis("\nLooks fine overall.\nNo blockers.\n\nExtra notes.", 5);
        assert_eq!(parsed.summary, "Looks fine overall. No blockers.");
        assert!(parsed.recommendations.is_empty());
        assert!(parsed.risk_level.is_none());
        assert!(parsed.confidence_statement.is_none());
    }

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("12. Fix it"), Some("Fix it"));
        assert_eq!(strip_list_marker("3) Fix it"), Some("Fix it"));
        assert_eq!(strip_list_marker("- Fix it"), Some("Fix it"));
        assert_eq!(strip_list_marker("2024 was fine"), None);
        assert_eq!(strip_list_marker("Fix it"), None);
    }

    #[tokio::test]
    async fn test_zero_successes_skip_synthesis() {
        let backend = FixedBackend::answering(SYNTHESIS);
        let (tasks, results) = run(&[(AnalysisKind::Security, false), (AnalysisKind::Testing, false)]);

        let result = coordinator(backend.clone())
            .coordinate(&tasks[0].payload, &tasks, &results)
            .await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.successful_tasks, 0);
        assert_eq!(result.total_tasks, 2);
        assert_eq!(
            result.failed_kinds,
            vec![AnalysisKind::Security, AnalysisKind::Testing]
        );
        assert!(result.is_degraded());
    }

    #[tokio::test]
    async fn test_successful_synthesis() {
        let backend = FixedBackend::answering(SYNTHESIS);
        let (tasks, results) = run(&[
            (AnalysisKind::Architecture, true),
            (AnalysisKind::Security, true),
            (AnalysisKind::Performance, true),
            (AnalysisKind::Quality, true),
            (AnalysisKind::Testing, false),
        ]);

        let result = coordinator(backend.clone())
            .coordinate(&tasks[0].payload, &tasks, &results)
            .await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.risk_level, Some(RiskLevel::High));
        assert_eq!(result.recommendations.len(), 5);
        assert_eq!(result.failed_kinds, vec![AnalysisKind::Testing]);
        assert_eq!(result.synthesis_tokens, 70);
        assert!(!result.synthesis_failed);
    }

    #[tokio::test]
    async fn test_synthesis_failure_falls_back_to_raw_outputs() {
        let backend = FixedBackend::failing();
        let (tasks, results) = run(&[
            (AnalysisKind::Documentation, true),
            (AnalysisKind::Security, true),
        ]);

        let result = coordinator(backend)
            .coordinate(&tasks[0].payload, &tasks, &results)
            .await;

        assert!(result.synthesis_failed);
        assert_eq!(result.confidence, Confidence::Medium);
        assert!(result.note.as_deref().unwrap().contains("429"));
        let security = result.narrative.find("## SECURITY").unwrap();
        let docs = result.narrative.find("## DOCUMENTATION").unwrap();
        assert!(security < docs, "outputs follow canonical kind order");
        assert!(result.narrative.contains("security findings"));
    }

    #[tokio::test]
    async fn test_empty_synthesis_counts_as_failure() {
        let backend = FixedBackend::answering("  \n ");
        let (tasks, results) = run(&[(AnalysisKind::Quality, true)]);

        let result = coordinator(backend)
            .coordinate(&tasks[0].payload, &tasks, &results)
            .await;

        assert!(result.synthesis_failed);
        assert!(result.narrative.contains("quality findings"));
    }
}
