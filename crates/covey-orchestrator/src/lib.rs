//! Multi-agent analysis swarm with bounded execution, result coordination,
//! and live metrics.
//!
//! A work item is fanned out into one task per requested [`AnalysisKind`],
//! each handled by a specialized agent backed by its own model. Tasks run
//! under a global concurrency cap and a per-task timeout; their results are
//! merged by a coordinator into a single confidence-rated summary.
//!
//! # Main types
//!
//! - [`Swarm`]: Top-level facade: build tasks, execute them, coordinate results.
//! - [`AgentRegistry`]: Registered agent profiles, fixed before any run.
//! - [`BoundedExecutor`]: Concurrency-capped, timeout-enforcing task runner.
//! - [`ResultCoordinator`]: Confidence derivation and synthesis with fallback.
//! - [`SwarmMonitor`]: Per-agent metrics and swarm-wide totals.

/// Swarm tuning (`[swarm]` config table).
pub mod config;
/// Result coordination and synthesis parsing.
pub mod coordinator;
/// Swarm facade and run pipeline.
pub mod engine;
/// Bounded-concurrency task execution.
pub mod executor;
/// Per-agent metrics and swarm totals.
pub mod monitor;
/// Default agent profiles.
pub mod profiles;
/// Built-in and custom prompt templates.
pub mod prompts;
/// Agent registry.
pub mod registry;
/// Work item → task decomposition.
pub mod task_builder;
/// Shared swarm types (Task, TaskResult, AgentProfile, etc.).
pub mod types;

pub use config::SwarmConfig;
pub use coordinator::{parse_synthesis, ParsedSynthesis, ResultCoordinator};
pub use engine::Swarm;
pub use executor::BoundedExecutor;
pub use monitor::{MetricsSnapshot, SwarmMonitor, SwarmTotals};
pub use profiles::{default_coordinator_model, default_profiles};
pub use prompts::PromptTemplate;
pub use registry::{AgentRegistry, AgentSlot};
pub use task_builder::TaskBuilder;
pub use types::{
    AgentMetrics, AgentProfile, AnalysisKind, Confidence, ModelSpec, Priority, RiskLevel,
    SwarmRun, SynthesizedResult, Task, TaskErrorKind, TaskResult, WorkItem,
};
