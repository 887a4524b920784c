use crate::profiles::default_coordinator_model;
use crate::types::ModelSpec;
use covey_core::{CoveyError, CoveyResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Swarm-wide tuning. Every field has a default so an empty `[swarm]` table
/// is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Upper bound on simultaneously executing tasks across all runs.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Per-task wall-clock limit on the inference call.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
    /// Limit on the synthesis call; falls back to `task_timeout_secs`.
    #[serde(default)]
    pub synthesis_timeout_secs: Option<u64>,
    /// How many recommendations the synthesized result keeps.
    #[serde(default = "default_top_recommendations")]
    pub top_recommendations: usize,
    /// Model used for the synthesis call.
    #[serde(default = "default_coordinator_model")]
    pub coordinator: ModelSpec,
}

fn default_max_concurrency() -> usize {
    6
}

fn default_task_timeout_secs() -> u64 {
    120
}

fn default_top_recommendations() -> usize {
    5
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            task_timeout_secs: default_task_timeout_secs(),
            synthesis_timeout_secs: None,
            top_recommendations: default_top_recommendations(),
            coordinator: default_coordinator_model(),
        }
    }
}

impl SwarmConfig {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_task_timeout_secs(mut self, secs: u64) -> Self {
        self.task_timeout_secs = secs;
        self
    }

    pub fn with_coordinator(mut self, model: ModelSpec) -> Self {
        self.coordinator = model;
        self
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    /// Bound on the coordinator call, the task timeout when unset. A run can
    /// therefore take up to task timeout plus this after its last admission.
    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs.unwrap_or(self.task_timeout_secs))
    }

    /// Reject values that would stall or starve the executor.
    pub fn validate(&self) -> CoveyResult<()> {
        if self.max_concurrency == 0 {
            return Err(CoveyError::Config("max_concurrency must be at least 1".into()));
        }
        if self.task_timeout_secs == 0 {
            return Err(CoveyError::Config("task_timeout_secs must be at least 1".into()));
        }
        if self.synthesis_timeout_secs == Some(0) {
            return Err(CoveyError::Config("synthesis_timeout_secs must be at least 1".into()));
        }
        if self.top_recommendations == 0 {
            return Err(CoveyError::Config("top_recommendations must be at least 1".into()));
        }
        if self.coordinator.model_id.trim().is_empty() {
            return Err(CoveyError::Config("coordinator model_id must not be empty".into()));
        }
        Ok(())
    }
}
