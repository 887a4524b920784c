use crate::profiles::default_profiles;
use crate::types::{AgentProfile, AnalysisKind};
use covey_core::{CoveyError, CoveyResult};
use std::collections::HashMap;
use tracing::error;

/// Stable index of a registered agent. Assigned in registration order and
/// never reused; the metrics arena is keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentSlot(usize);

impl AgentSlot {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Holds the set of agent profiles available to a swarm.
///
/// Built once before any run starts and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct AgentRegistry {
    profiles: Vec<AgentProfile>,
    by_id: HashMap<String, AgentSlot>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the six default analysis agents.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for profile in default_profiles() {
            if let Err(e) = registry.register(profile) {
                debug_assert!(false, "default profile rejected: {e}");
                error!(error = %e, "Default agent profile rejected");
            }
        }
        registry
    }

    /// Build a registry from profiles, rejecting the first invalid one.
    pub fn from_profiles(profiles: impl IntoIterator<Item = AgentProfile>) -> CoveyResult<Self> {
        let mut registry = Self::new();
        for profile in profiles {
            registry.register(profile)?;
        }
        Ok(registry)
    }

    /// Add a profile. Fails on a duplicate id or an empty capability set.
    pub fn register(&mut self, profile: AgentProfile) -> CoveyResult<AgentSlot> {
        if self.by_id.contains_key(&profile.id) {
            return Err(CoveyError::DuplicateAgent(profile.id));
        }
        if profile.id.trim().is_empty() {
            return Err(CoveyError::Config("agent id must not be empty".to_string()));
        }
        if profile.capabilities.is_empty() {
            return Err(CoveyError::Config(format!(
                "agent '{}' declares no capabilities",
                profile.id
            )));
        }

        let slot = AgentSlot(self.profiles.len());
        self.by_id.insert(profile.id.clone(), slot);
        self.profiles.push(profile);
        Ok(slot)
    }

    pub fn lookup(&self, agent_id: &str) -> CoveyResult<&AgentProfile> {
        self.resolve(agent_id).map(|(_, profile)| profile)
    }

    /// Slot and profile for an agent id.
    pub fn resolve(&self, agent_id: &str) -> CoveyResult<(AgentSlot, &AgentProfile)> {
        self.by_id
            .get(agent_id)
            .and_then(|slot| self.profiles.get(slot.0).map(|p| (*slot, p)))
            .ok_or_else(|| CoveyError::UnknownAgent(agent_id.to_string()))
    }

    /// First agent, in registration order, declaring `kind`.
    pub fn find_capable(&self, kind: AnalysisKind) -> Option<&AgentProfile> {
        self.profiles.iter().find(|p| p.can_handle(kind))
    }

    /// All profiles in registration order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentProfile> {
        self.profiles.iter()
    }

    /// `(slot, agent id)` pairs in registration order.
    pub(crate) fn slots(&self) -> impl Iterator<Item = (AgentSlot, &str)> {
        self.profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (AgentSlot(i), p.id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
