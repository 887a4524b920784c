use crate::config::SwarmConfig;
use crate::coordinator::ResultCoordinator;
use crate::executor::BoundedExecutor;
use crate::monitor::{MetricsSnapshot, SwarmMonitor};
use crate::registry::AgentRegistry;
use crate::task_builder::TaskBuilder;
use crate::types::{AnalysisKind, SwarmRun, WorkItem};
use chrono::Utc;
use covey_agent::InferenceBackend;
use covey_core::CoveyResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// A configured swarm of analysis agents.
///
/// Implements the build → execute → coordinate pipeline. Safe to share
/// behind an `Arc`: concurrent [`Swarm::submit_run`] calls share one
/// concurrency cap and one set of metrics.
pub struct Swarm {
    registry: Arc<AgentRegistry>,
    monitor: Arc<SwarmMonitor>,
    executor: BoundedExecutor,
    coordinator: ResultCoordinator,
    config: SwarmConfig,
}

impl Swarm {
    /// Create a swarm over a fixed registry. The registry cannot change
    /// afterwards.
    pub fn new(
        registry: AgentRegistry,
        backend: Arc<dyn InferenceBackend>,
        config: SwarmConfig,
    ) -> CoveyResult<Self> {
        config.validate()?;

        let registry = Arc::new(registry);
        let monitor = Arc::new(SwarmMonitor::new(&registry));
        let executor = BoundedExecutor::new(
            registry.clone(),
            backend.clone(),
            monitor.clone(),
            config.max_concurrency,
            config.task_timeout(),
        );
        let coordinator = ResultCoordinator::new(
            backend,
            config.coordinator.clone(),
            config.top_recommendations,
            config.synthesis_timeout(),
        );

        info!(
            agents = registry.len(),
            max_concurrency = config.max_concurrency,
            task_timeout_secs = config.task_timeout_secs,
            "Swarm ready"
        );

        Ok(Self {
            registry,
            monitor,
            executor,
            coordinator,
            config,
        })
    }

    /// The six default agents with default tuning.
    pub fn with_defaults(backend: Arc<dyn InferenceBackend>) -> CoveyResult<Self> {
        Self::new(AgentRegistry::with_defaults(), backend, SwarmConfig::default())
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn monitor(&self) -> &Arc<SwarmMonitor> {
        &self.monitor
    }

    /// Snapshot of per-agent and swarm-wide metrics. Callable at any time,
    /// including while runs are in flight.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.monitor.snapshot()
    }

    /// Run the full pipeline for one work item.
    ///
    /// Phase 1 (Build): one task per requested kind with a capable agent.
    /// Phase 2 (Execute): bounded-concurrency execution to a terminal result
    /// per task.
    /// Phase 3 (Coordinate): confidence plus synthesis over the results.
    ///
    /// Per-task failures never fail the run; they lower its confidence. With
    /// nothing to execute the run completes at once with a degraded result.
    pub async fn submit_run(
        &self,
        work_item: WorkItem,
        requested_kinds: impl IntoIterator<Item = AnalysisKind>,
    ) -> CoveyResult<SwarmRun> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();

        info!(
            run_id = %run_id,
            work_item = %work_item.id,
            analysis_target = %work_item.target,
            "Swarm run starting"
        );

        let tasks = TaskBuilder::new(&self.registry).build(&work_item, requested_kinds);

        let results = if tasks.is_empty() {
            warn!(run_id = %run_id, "No tasks to execute");
            HashMap::new()
        } else {
            info!(run_id = %run_id, task_count = tasks.len(), "Executing tasks");
            self.executor.execute(&tasks).await?
        };

        let synthesized = self.coordinator.coordinate(&work_item, &tasks, &results).await;
        self.monitor.run_finished();

        let duration_ms = clock.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            elapsed_ms = duration_ms,
            successes = synthesized.successful_tasks,
            total = synthesized.total_tasks,
            confidence = %synthesized.confidence,
            "Swarm run complete"
        );

        Ok(SwarmRun {
            run_id,
            work_item_id: work_item.id,
            tasks,
            results,
            confidence: synthesized.confidence,
            synthesized_result: Some(synthesized),
            started_at,
            finished_at: Some(Utc::now()),
            duration_ms,
        })
    }
}
