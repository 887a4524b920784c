use crate::registry::AgentRegistry;
use crate::types::{AnalysisKind, Task, WorkItem};
use std::collections::BTreeSet;
use tracing::debug;

/// Turns a work item plus requested analysis kinds into tasks.
///
/// Kinds are de-duplicated and walked in canonical order; each goes to the
/// first agent in registration order that declares it. A kind with no
/// capable agent is skipped. The builder never invents agents, so every
/// task it emits references a registered one.
pub struct TaskBuilder<'a> {
    registry: &'a AgentRegistry,
}

impl<'a> TaskBuilder<'a> {
    pub fn new(registry: &'a AgentRegistry) -> Self {
        Self { registry }
    }

    /// Build at most one task per distinct requested kind.
    pub fn build(
        &self,
        work_item: &WorkItem,
        requested_kinds: impl IntoIterator<Item = AnalysisKind>,
    ) -> Vec<Task> {
        let kinds: BTreeSet<AnalysisKind> = requested_kinds.into_iter().collect();
        let mut tasks = Vec::with_capacity(kinds.len());

        for kind in kinds {
            match self.registry.find_capable(kind) {
                Some(agent) => {
                    let task = Task::new(agent.id.clone(), kind, work_item.clone(), tasks.len());
                    debug!(task_id = %task.id, kind = %kind, agent_id = %agent.id, "Task built");
                    tasks.push(task);
                }
                None => debug!(kind = %kind, "No registered agent can handle kind, skipping"),
            }
        }

        tasks
    }

    /// Requested kinds that no registered agent can handle.
    pub fn uncovered(
        &self,
        requested_kinds: impl IntoIterator<Item = AnalysisKind>,
    ) -> Vec<AnalysisKind> {
        requested_kinds
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|kind| self.registry.find_capable(*kind).is_none())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::{AgentProfile, ModelSpec, Priority};

    fn work_item() -> WorkItem {
        WorkItem::new("acme/api", "review").with_id("wi-1")
    }

    #[test]
    fn test_build_all_kinds_with_defaults() {
        let registry = AgentRegistry::with_defaults();
        let tasks = TaskBuilder::new(&registry).build(&work_item(), AnalysisKind::ALL);

        assert_eq!(tasks.len(), 6);
        let kinds: Vec<AnalysisKind> = tasks.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, AnalysisKind::ALL.to_vec());
        for (i, task) in tasks.iter().enumerate() {
            assert_eq!(task.sequence, i);
            assert_eq!(task.payload.id, "wi-1");
            assert!(registry.lookup(&task.agent_id).is_ok());
        }
    }

    #[test]
    fn test_build_dedupes_and_canonicalizes_order() {
        let registry = AgentRegistry::with_defaults();
        let tasks = TaskBuilder::new(&registry).build(
            &work_item(),
            [
                AnalysisKind::Documentation,
                AnalysisKind::Security,
                AnalysisKind::Documentation,
            ],
        );

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].kind, AnalysisKind::Security);
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(tasks[1].kind, AnalysisKind::Documentation);
        assert_eq!(tasks[1].priority, Priority::Low);
    }

    #[test]
    fn test_build_skips_uncovered_kinds() {
        let registry = AgentRegistry::from_profiles([AgentProfile::new(
            "sec",
            [AnalysisKind::Security],
            ModelSpec::new("m", 100, 0.1),
        )])
        .unwrap();
        let builder = TaskBuilder::new(&registry);

        let tasks = builder.build(&work_item(), [AnalysisKind::Security, AnalysisKind::Testing]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].agent_id, "sec");
        assert_eq!(
            builder.uncovered([AnalysisKind::Security, AnalysisKind::Testing]),
            vec![AnalysisKind::Testing]
        );
    }

    #[test]
    fn test_build_empty_request() {
        let registry = AgentRegistry::with_defaults();
        let tasks = TaskBuilder::new(&registry).build(&work_item(), []);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_multi_capability_agent_gets_several_tasks() {
        let registry = AgentRegistry::from_profiles([AgentProfile::new(
            "generalist",
            AnalysisKind::ALL,
            ModelSpec::new("m", 100, 0.1),
        )])
        .unwrap();
        let tasks = TaskBuilder::new(&registry).build(&work_item(), AnalysisKind::ALL);
        assert_eq!(tasks.len(), 6);
        assert!(tasks.iter().all(|t| t.agent_id == "generalist"));
    }
}
