use crate::prompts::PromptTemplate;
use chrono::{DateTime, Utc};
use covey_agent::{InferenceOptions, Usage};
use covey_core::{CoveyError, CoveyResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use uuid::Uuid;

/// The fixed set of analyses a swarm can run against a work item.
///
/// Variant order is the canonical order: tasks are emitted, and outputs are
/// concatenated for synthesis, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    /// Module structure, layering, coupling.
    Architecture,
    /// Vulnerabilities, secrets, unsafe input handling.
    Security,
    /// Hot paths, allocation, I/O patterns.
    Performance,
    /// Readability, duplication, error handling.
    Quality,
    /// Test coverage and strategy.
    Testing,
    /// API docs, READMEs, onboarding material.
    Documentation,
}

impl AnalysisKind {
    /// Every kind, in canonical order.
    pub const ALL: [AnalysisKind; 6] = [
        AnalysisKind::Architecture,
        AnalysisKind::Security,
        AnalysisKind::Performance,
        AnalysisKind::Quality,
        AnalysisKind::Testing,
        AnalysisKind::Documentation,
    ];

    /// Static scheduling priority for this kind.
    pub fn priority(self) -> Priority {
        match self {
            AnalysisKind::Architecture | AnalysisKind::Security => Priority::High,
            AnalysisKind::Performance | AnalysisKind::Quality => Priority::Medium,
            AnalysisKind::Testing | AnalysisKind::Documentation => Priority::Low,
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisKind::Architecture => write!(f, "architecture"),
            AnalysisKind::Security => write!(f, "security"),
            AnalysisKind::Performance => write!(f, "performance"),
            AnalysisKind::Quality => write!(f, "quality"),
            AnalysisKind::Testing => write!(f, "testing"),
            AnalysisKind::Documentation => write!(f, "documentation"),
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = CoveyError;

    fn from_str(s: &str) -> CoveyResult<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        AnalysisKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == wanted)
            .ok_or_else(|| CoveyError::Config(format!("unknown analysis kind '{s}'")))
    }
}

/// Scheduling preference. Only affects admission order, never correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Backing model for an agent plus its sampling options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub model_id: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    InferenceOptions::default().max_tokens
}

fn default_temperature() -> f32 {
    InferenceOptions::default().temperature
}

impl ModelSpec {
    pub fn new(model_id: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model_id: model_id.into(),
            max_tokens,
            temperature,
        }
    }

    pub fn options(&self) -> InferenceOptions {
        InferenceOptions::new(self.max_tokens, self.temperature)
    }
}

/// A named capability profile bound to a backing model and prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub capabilities: BTreeSet<AnalysisKind>,
    pub model: ModelSpec,
    /// Absent in config means the built-in template for the task's kind.
    #[serde(default)]
    pub prompt: PromptTemplate,
}

impl AgentProfile {
    pub fn new(
        id: impl Into<String>,
        capabilities: impl IntoIterator<Item = AnalysisKind>,
        model: ModelSpec,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            capabilities: capabilities.into_iter().collect(),
            model,
            prompt: PromptTemplate::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn can_handle(&self, kind: AnalysisKind) -> bool {
        self.capabilities.contains(&kind)
    }
}

/// The unit of work a swarm run analyzes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    /// What is being analyzed, e.g. a repository name or path.
    pub target: String,
    #[serde(default)]
    pub description: String,
    /// Extra material for the agents, e.g. a repository summary or file tree.
    #[serde(default)]
    pub context: Option<String>,
}

impl WorkItem {
    pub fn new(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            target: target.into(),
            description: description.into(),
            context: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// One unit of work assigned to exactly one agent. Never mutated after the
/// task builder emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub agent_id: String,
    pub kind: AnalysisKind,
    pub priority: Priority,
    pub payload: WorkItem,
    pub created_at: DateTime<Utc>,
    /// Emission index within the run.
    pub sequence: usize,
}

impl Task {
    pub fn new(
        agent_id: impl Into<String>,
        kind: AnalysisKind,
        payload: WorkItem,
        sequence: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id: agent_id.into(),
            kind,
            priority: kind.priority(),
            payload,
            created_at: Utc::now(),
            sequence,
        }
    }
}

/// Why a task produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskErrorKind {
    /// The inference call did not finish within the per-task timeout.
    Timeout,
    /// The backend failed the call.
    Inference,
    /// The backend answered with nothing usable.
    MalformedResponse,
}

impl TaskErrorKind {
    pub fn from_error(err: &CoveyError) -> Self {
        match err {
            CoveyError::MalformedResponse(_) => TaskErrorKind::MalformedResponse,
            _ => TaskErrorKind::Inference,
        }
    }
}

impl std::fmt::Display for TaskErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskErrorKind::Timeout => write!(f, "timeout"),
            TaskErrorKind::Inference => write!(f, "inference"),
            TaskErrorKind::MalformedResponse => write!(f, "malformed_response"),
        }
    }
}

/// Terminal outcome of one task. `output` is present iff `success`;
/// `error_kind` and `error_message` are present iff not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: Uuid,
    pub agent_id: String,
    pub kind: AnalysisKind,
    pub success: bool,
    pub output: Option<String>,
    pub error_kind: Option<TaskErrorKind>,
    pub error_message: Option<String>,
    #[serde(default)]
    pub tokens_used: u64,
    pub execution_time_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl TaskResult {
    pub fn succeeded(
        task: &Task,
        output: impl Into<String>,
        usage: Usage,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            task_id: task.id,
            agent_id: task.agent_id.clone(),
            kind: task.kind,
            success: true,
            output: Some(output.into()),
            error_kind: None,
            error_message: None,
            tokens_used: usage.total_tokens,
            execution_time_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(
        task: &Task,
        error_kind: TaskErrorKind,
        message: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            task_id: task.id,
            agent_id: task.agent_id.clone(),
            kind: task.kind,
            success: false,
            output: None,
            error_kind: Some(error_kind),
            error_message: Some(message.into()),
            tokens_used: 0,
            execution_time_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.error_kind == Some(TaskErrorKind::Timeout)
    }
}

/// Coarse quality signal derived from how many tasks succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Number of successful tasks needed for [`Confidence::High`].
    pub const HIGH_THRESHOLD: usize = 4;

    /// `high` at 4+ successes, `medium` at 1–3, `low` at 0. Which tasks
    /// succeeded does not matter.
    pub fn from_successes(successes: usize) -> Self {
        match successes {
            0 => Confidence::Low,
            n if n >= Self::HIGH_THRESHOLD => Confidence::High,
            _ => Confidence::Medium,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Qualitative risk level reported by the synthesis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// First word of `text` that names a risk level, if any.
    pub fn from_text(text: &str) -> Option<Self> {
        text.split(|c: char| !c.is_ascii_alphabetic())
            .find_map(|word| match word.to_ascii_lowercase().as_str() {
                "low" | "minimal" => Some(RiskLevel::Low),
                "medium" | "moderate" => Some(RiskLevel::Medium),
                "high" | "elevated" => Some(RiskLevel::High),
                "critical" | "severe" => Some(RiskLevel::Critical),
                _ => None,
            })
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// The coordinated result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizedResult {
    pub confidence: Confidence,
    pub summary: String,
    /// Ranked, at most `top_recommendations` entries.
    pub recommendations: Vec<String>,
    pub risk_level: Option<RiskLevel>,
    pub confidence_statement: Option<String>,
    /// Full synthesis text, or the raw concatenated outputs when synthesis
    /// failed.
    pub narrative: String,
    /// Set when the synthesis call failed and `narrative` is the raw outputs.
    pub synthesis_failed: bool,
    pub note: Option<String>,
    pub successful_tasks: usize,
    pub total_tasks: usize,
    pub failed_kinds: Vec<AnalysisKind>,
    #[serde(default)]
    pub synthesis_tokens: u64,
}

impl SynthesizedResult {
    /// No synthesis happened and there is nothing to report.
    pub fn is_degraded(&self) -> bool {
        self.successful_tasks == 0 || self.synthesis_failed
    }
}

/// The full set of tasks submitted for one work item plus their coordinated
/// result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmRun {
    pub run_id: Uuid,
    pub work_item_id: String,
    /// In task builder emission order.
    pub tasks: Vec<Task>,
    pub results: HashMap<Uuid, TaskResult>,
    pub synthesized_result: Option<SynthesizedResult>,
    pub confidence: Confidence,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
}

impl SwarmRun {
    /// Every submitted task has a terminal result.
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|t| self.results.contains_key(&t.id))
    }

    pub fn result_for(&self, task_id: Uuid) -> Option<&TaskResult> {
        self.results.get(&task_id)
    }

    pub fn successful_count(&self) -> usize {
        self.results.values().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.values().filter(|r| !r.success).count()
    }

    pub fn timeout_count(&self) -> usize {
        self.results.values().filter(|r| r.is_timeout()).count()
    }
}

/// Running counters for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    /// Subset of `tasks_failed`.
    pub timeouts: u64,
    /// Exponential moving average of task execution time.
    pub average_response_time_ms: f64,
    pub success_rate_percent: f64,
    pub tokens_used: u64,
    pub total_time_ms: u64,
    pub last_activity: Option<DateTime<Utc>>,
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self {
            tasks_completed: 0,
            tasks_failed: 0,
            timeouts: 0,
            average_response_time_ms: 0.0,
            success_rate_percent: 100.0,
            tokens_used: 0,
            total_time_ms: 0,
            last_activity: None,
        }
    }
}

impl AgentMetrics {
    /// Weight of the newest sample in the response time average.
    pub const RESPONSE_TIME_WEIGHT: f64 = 0.2;

    pub fn tasks_total(&self) -> u64 {
        self.tasks_completed + self.tasks_failed
    }

    /// Fold one terminal task result into the counters.
    pub fn record(&mut self, result: &TaskResult) {
        let sample = result.execution_time_ms as f64;
        self.average_response_time_ms = if self.tasks_total() == 0 {
            sample
        } else {
            self.average_response_time_ms * (1.0 - Self::RESPONSE_TIME_WEIGHT)
                + sample * Self::RESPONSE_TIME_WEIGHT
        };

        if result.success {
            self.tasks_completed += 1;
        } else {
            self.tasks_failed += 1;
            if result.is_timeout() {
                self.timeouts += 1;
            }
        }

        self.tokens_used += result.tokens_used;
        self.total_time_ms += result.execution_time_ms;
        self.last_activity = Some(result.completed_at);
        self.success_rate_percent = success_rate(self.tasks_completed, self.tasks_total());
    }
}

/// `completed / total * 100`, or 100 when nothing ran.
pub(crate) fn success_rate(completed: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}
