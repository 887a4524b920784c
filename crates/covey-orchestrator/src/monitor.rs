use crate::registry::{AgentRegistry, AgentSlot};
use crate::types::{success_rate, AgentMetrics, TaskResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Per-agent metrics plus swarm-wide gauges.
///
/// One mutex-guarded [`AgentMetrics`] per registered agent, indexed by
/// [`AgentSlot`]. Only the executor writes; readers get cloned snapshots and
/// never observe a half-applied update.
pub struct SwarmMonitor {
    agents: Vec<(String, Mutex<AgentMetrics>)>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    runs_completed: AtomicU64,
}

impl SwarmMonitor {
    pub fn new(registry: &AgentRegistry) -> Self {
        Self {
            agents: registry
                .slots()
                .map(|(_, id)| (id.to_string(), Mutex::new(AgentMetrics::default())))
                .collect(),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            runs_completed: AtomicU64::new(0),
        }
    }

    /// A task took an execution slot.
    pub(crate) fn task_admitted(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    /// Fold a terminal result into its agent's metrics.
    pub(crate) fn record_result(&self, slot: AgentSlot, result: &TaskResult) {
        if let Some((_, metrics)) = self.agents.get(slot.index()) {
            metrics.lock().record(result);
        }
    }

    /// A task gave its execution slot back.
    pub(crate) fn task_released(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn run_finished(&self) {
        self.runs_completed.fetch_add(1, Ordering::SeqCst);
    }

    /// Tasks currently holding an execution slot.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of tasks ever in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn agent_metrics(&self, agent_id: &str) -> Option<AgentMetrics> {
        self.agents
            .iter()
            .find(|(id, _)| id == agent_id)
            .map(|(_, metrics)| metrics.lock().clone())
    }

    /// Copy of every agent's metrics plus swarm totals derived from them.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let per_agent: BTreeMap<String, AgentMetrics> = self
            .agents
            .iter()
            .map(|(id, metrics)| (id.clone(), metrics.lock().clone()))
            .collect();
        let swarm = SwarmTotals::from_agents(
            per_agent.values(),
            self.in_flight(),
            self.peak_in_flight(),
            self.runs_completed.load(Ordering::SeqCst),
        );
        MetricsSnapshot { per_agent, swarm }
    }

    /// Serialize the current state as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.snapshot().to_json()
    }
}

/// Point-in-time view of all metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub per_agent: BTreeMap<String, AgentMetrics>,
    pub swarm: SwarmTotals,
}

impl MetricsSnapshot {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "per_agent": self.per_agent,
            "swarm": self.swarm,
        })
    }
}

/// Swarm-wide totals derived from the per-agent counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SwarmTotals {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub timeouts: u64,
    pub tokens_used: u64,
    /// Mean execution time over all terminal tasks, 0 when none ran.
    pub average_task_time_ms: f64,
    /// Completed share of all terminal tasks, 100 when none ran.
    pub swarm_efficiency_percent: f64,
    pub in_flight: usize,
    pub peak_in_flight: usize,
    pub runs_completed: u64,
}

impl SwarmTotals {
    fn from_agents<'a>(
        agents: impl Iterator<Item = &'a AgentMetrics>,
        in_flight: usize,
        peak_in_flight: usize,
        runs_completed: u64,
    ) -> Self {
        let mut totals = SwarmTotals {
            in_flight,
            peak_in_flight,
            runs_completed,
            ..Default::default()
        };
        let mut total_time_ms = 0u64;
        for m in agents {
            totals.completed_tasks += m.tasks_completed;
            totals.failed_tasks += m.tasks_failed;
            totals.timeouts += m.timeouts;
            totals.tokens_used += m.tokens_used;
            total_time_ms += m.total_time_ms;
        }
        totals.total_tasks = totals.completed_tasks + totals.failed_tasks;
        totals.average_task_time_ms = if totals.total_tasks == 0 {
            0.0
        } else {
            total_time_ms as f64 / totals.total_tasks as f64
        };
        totals.swarm_efficiency_percent = success_rate(totals.completed_tasks, totals.total_tasks);
        totals
    }
}
