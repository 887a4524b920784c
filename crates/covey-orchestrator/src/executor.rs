use crate::monitor::SwarmMonitor;
use crate::registry::{AgentRegistry, AgentSlot};
use crate::types::{AgentProfile, Task, TaskErrorKind, TaskResult};
use covey_agent::{InferenceBackend, InferenceOptions};
use covey_core::{CoveyError, CoveyResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runs tasks against their agents' models with a global concurrency cap
/// and a per-task timeout.
///
/// The permit pool is shared by every `execute` call on the same executor,
/// so the cap holds across concurrent runs. Within one call, tasks are
/// admitted in descending priority, ties in emission order.
pub struct BoundedExecutor {
    registry: Arc<AgentRegistry>,
    backend: Arc<dyn InferenceBackend>,
    monitor: Arc<SwarmMonitor>,
    permits: Arc<Semaphore>,
    max_concurrency: usize,
    task_timeout: Duration,
}

/// Everything a detached inference call needs.
struct InferenceCall {
    backend: Arc<dyn InferenceBackend>,
    prompt: String,
    model_id: String,
    options: InferenceOptions,
}

impl InferenceCall {
    fn for_task(backend: Arc<dyn InferenceBackend>, task: &Task, profile: &AgentProfile) -> Self {
        Self {
            backend,
            prompt: profile.prompt.render(task),
            model_id: profile.model.model_id.clone(),
            options: profile.model.options(),
        }
    }
}

/// A task holding an execution slot.
///
/// Dropping the guard gives the slot back and decrements the in-flight gauge,
/// also when the worker is aborted because the caller dropped the run. A task
/// dropped before [`InFlight::finish`] is recorded as a failure so its agent's
/// metrics still see the termination.
struct InFlight {
    monitor: Arc<SwarmMonitor>,
    slot: AgentSlot,
    task: Task,
    admitted_at: Instant,
    finished: bool,
    _permit: OwnedSemaphorePermit,
}

impl InFlight {
    fn admit(
        monitor: Arc<SwarmMonitor>,
        slot: AgentSlot,
        task: Task,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        monitor.task_admitted();
        Self {
            monitor,
            slot,
            task,
            admitted_at: Instant::now(),
            finished: false,
            _permit: permit,
        }
    }

    fn finish(mut self, result: &TaskResult) {
        self.monitor.record_result(self.slot, result);
        self.finished = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            warn!(task_id = %self.task.id, agent_id = %self.task.agent_id, "Task cancelled");
            let result = TaskResult::failed(
                &self.task,
                TaskErrorKind::Inference,
                "task cancelled before completion",
                self.admitted_at.elapsed().as_millis() as u64,
            );
            self.monitor.record_result(self.slot, &result);
        }
        // Runs before the permit field is dropped.
        self.monitor.task_released();
    }
}

impl BoundedExecutor {
    pub fn new(
        registry: Arc<AgentRegistry>,
        backend: Arc<dyn InferenceBackend>,
        monitor: Arc<SwarmMonitor>,
        max_concurrency: usize,
        task_timeout: Duration,
    ) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            registry,
            backend,
            monitor,
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            task_timeout,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Execution slots not currently held by a task.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run every task to a terminal result.
    ///
    /// Fails before admitting anything if the list is empty or any task names
    /// an unregistered agent. Otherwise always returns exactly one result per
    /// task; per-task failures are recorded in the results, not returned.
    pub async fn execute(&self, tasks: &[Task]) -> CoveyResult<HashMap<Uuid, TaskResult>> {
        if tasks.is_empty() {
            return Err(CoveyError::EmptyTaskList);
        }

        let mut admission = tasks
            .iter()
            .map(|task| {
                let (slot, profile) = self.registry.resolve(&task.agent_id)?;
                Ok((task, slot, profile))
            })
            .collect::<CoveyResult<Vec<_>>>()?;
        // Stable: equal priorities keep emission order.
        admission.sort_by(|a, b| b.0.priority.cmp(&a.0.priority));

        let mut running = JoinSet::new();

        for (task, slot, profile) in admission {
            let permit = self
                .permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| CoveyError::Config("executor permit pool closed".to_string()))?;
            let guard = InFlight::admit(self.monitor.clone(), slot, task.clone(), permit);
            debug!(
                task_id = %task.id,
                agent_id = %task.agent_id,
                kind = %task.kind,
                priority = %task.priority,
                "Task admitted"
            );

            let call = InferenceCall::for_task(self.backend.clone(), task, profile);
            let timeout = self.task_timeout;
            running.spawn(async move {
                let result = run_task(&guard.task, call, timeout).await;
                guard.finish(&result);
                result
            });
        }

        let mut results = HashMap::with_capacity(tasks.len());
        while let Some(joined) = running.join_next().await {
            match joined {
                Ok(result) => {
                    results.insert(result.task_id, result);
                }
                Err(e) => error!(error = %e, "Task worker terminated abnormally"),
            }
        }

        // A worker that died already had its failure recorded by its guard.
        for task in tasks {
            results.entry(task.id).or_insert_with(|| {
                TaskResult::failed(
                    task,
                    TaskErrorKind::Inference,
                    "task worker terminated abnormally",
                    0,
                )
            });
        }

        Ok(results)
    }
}

/// Race the inference call against the timeout. On timeout the call is left
/// running detached; its eventual outcome is discarded.
async fn run_task(task: &Task, call: InferenceCall, timeout: Duration) -> TaskResult {
    let started = Instant::now();
    let InferenceCall {
        backend,
        prompt,
        model_id,
        options,
    } = call;

    let handle = tokio::spawn(async move { backend.invoke(&prompt, &model_id, &options).await });
    let outcome = tokio::time::timeout(timeout, handle).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Err(_) => {
            warn!(
                task_id = %task.id,
                agent_id = %task.agent_id,
                timeout_secs = timeout.as_secs(),
                "Task timed out"
            );
            TaskResult::failed(
                task,
                TaskErrorKind::Timeout,
                format!("no completion within {}s", timeout.as_secs()),
                elapsed_ms,
            )
        }
        Ok(Err(join_error)) => {
            error!(task_id = %task.id, error = %join_error, "Inference call panicked");
            TaskResult::failed(
                task,
                TaskErrorKind::Inference,
                format!("inference call aborted: {join_error}"),
                elapsed_ms,
            )
        }
        Ok(Ok(Err(e))) => {
            warn!(task_id = %task.id, agent_id = %task.agent_id, error = %e, "Task failed");
            TaskResult::failed(task, TaskErrorKind::from_error(&e), e.to_string(), elapsed_ms)
        }
        Ok(Ok(Ok(completion))) if completion.text.trim().is_empty() => {
            warn!(task_id = %task.id, agent_id = %task.agent_id, "Empty completion");
            TaskResult::failed(
                task,
                TaskErrorKind::MalformedResponse,
                "backend returned an empty completion",
                elapsed_ms,
            )
        }
        Ok(Ok(Ok(completion))) => {
            info!(
                task_id = %task.id,
                agent_id = %task.agent_id,
                kind = %task.kind,
                elapsed_ms,
                tokens = completion.usage.total_tokens,
                "Task completed"
            );
            TaskResult::succeeded(task, completion.text, completion.usage, elapsed_ms)
        }
    }
}
