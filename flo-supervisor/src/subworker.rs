//! The subworker registry.
//!
//! A supervisor's main worker may spawn subworkers (delegate a piece of its
//! task to a nested agent running inside the same sandbox document).
//! Lifecycle is strictly nested: a subworker can never outlive its parent
//! supervisor, and its own state machine reuses
//! [`crate::lifecycle::SupervisorState`]/[`crate::lifecycle::Transition`]
//! rather than inventing a second, smaller one.

use crate::lifecycle::{InvalidTransition, SupervisorState, Transition};
use chrono::{DateTime, Utc};
use flo_core::id::SubworkerId;
use std::collections::HashMap;

/// One entry in a supervisor's subworker registry.
#[derive(Debug, Clone)]
pub struct SubworkerRecord {
    /// The model/tool configuration the subworker was spawned with.
    pub config: SubworkerConfig,
    /// When this subworker was spawned.
    pub created_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub state: SupervisorState,
}

/// The subset of configuration a spawned subworker needs — narrower than a
/// full [`crate::config::AgentConfig`] since a subworker shares its parent's
/// sandbox, network policy, and hub attachment rather than carrying its own.
#[derive(Debug, Clone)]
pub struct SubworkerConfig {
    /// Model id, provider-specific.
    pub model: String,
    /// System prompt for this subworker's task.
    pub system_prompt: Option<String>,
    /// Enabled tool names, a subset of the parent's.
    pub tools: Vec<String>,
}

impl SubworkerConfig {
    /// Build a new subworker config with no system prompt and no tools.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: None,
            tools: Vec::new(),
        }
    }
}

/// A subworker id was requested that is not registered.
#[derive(Debug, Clone, thiserror::Error)]
#[error("subworker not found: {0}")]
pub struct SubworkerNotFound(pub SubworkerId);

/// Per-supervisor registry of spawned subworkers, keyed by [`SubworkerId`].
#[derive(Debug, Default)]
pub struct SubworkerRegistry {
    entries: HashMap<SubworkerId, SubworkerRecord>,
}

impl SubworkerRegistry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly spawned subworker in `pending` state. The caller is
    /// responsible for actually relaying the spawn command into the sandbox;
    /// this only tracks the bookkeeping record.
    pub fn spawn(&mut self, id: SubworkerId, config: SubworkerConfig, now: DateTime<Utc>) {
        self.entries.insert(
            id,
            SubworkerRecord {
                config,
                created_at: now,
                state: SupervisorState::Pending,
            },
        );
    }

    /// Apply a lifecycle transition to a registered subworker.
    pub fn transition(
        &mut self,
        id: &SubworkerId,
        transition: Transition,
    ) -> Result<SupervisorState, SubworkerTransitionError> {
        let record = self
            .entries
            .get_mut(id)
            .ok_or_else(|| SubworkerTransitionError::NotFound(SubworkerNotFound(id.clone())))?;
        let next = record.state.apply(transition)?;
        record.state = next;
        Ok(next)
    }

    /// Remove a subworker from the registry outright (the terminal step of a `kill`).
    pub fn remove(&mut self, id: &SubworkerId) -> Option<SubworkerRecord> {
        self.entries.remove(id)
    }

    /// Look up a subworker's record.
    pub fn get(&self, id: &SubworkerId) -> Option<&SubworkerRecord> {
        self.entries.get(id)
    }

    /// Every registered subworker id, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &SubworkerId> {
        self.entries.keys()
    }

    /// How many subworkers are currently registered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no subworkers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors from applying a lifecycle transition to a registered subworker.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum SubworkerTransitionError {
    /// No subworker registered under the given id.
    #[error(transparent)]
    NotFound(#[from] SubworkerNotFound),
    /// The requested transition is not valid from the subworker's current state.
    #[error(transparent)]
    Invalid(#[from] InvalidTransition),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn spawn_registers_in_pending_state() {
        let mut registry = SubworkerRegistry::new();
        let id = SubworkerId::new("sub-1");
        registry.spawn(id.clone(), SubworkerConfig::new("claude-haiku-4-5"), now());
        assert_eq!(registry.get(&id).unwrap().state, SupervisorState::Pending);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn transition_moves_through_start_pause_resume() {
        let mut registry = SubworkerRegistry::new();
        let id = SubworkerId::new("sub-1");
        registry.spawn(id.clone(), SubworkerConfig::new("m"), now());
        assert_eq!(registry.transition(&id, Transition::Start).unwrap(), SupervisorState::Running);
        assert_eq!(registry.transition(&id, Transition::Pause).unwrap(), SupervisorState::Paused);
        assert_eq!(registry.transition(&id, Transition::Resume).unwrap(), SupervisorState::Running);
    }

    #[test]
    fn transition_on_unknown_id_is_not_found() {
        let mut registry = SubworkerRegistry::new();
        let err = registry.transition(&SubworkerId::new("ghost"), Transition::Start).unwrap_err();
        assert!(matches!(err, SubworkerTransitionError::NotFound(_)));
    }

    #[test]
    fn invalid_transition_is_reported_distinctly_from_not_found() {
        let mut registry = SubworkerRegistry::new();
        let id = SubworkerId::new("sub-1");
        registry.spawn(id.clone(), SubworkerConfig::new("m"), now());
        let err = registry.transition(&id, Transition::Resume).unwrap_err();
        assert!(matches!(err, SubworkerTransitionError::Invalid(_)));
    }

    #[test]
    fn kill_removes_the_record() {
        let mut registry = SubworkerRegistry::new();
        let id = SubworkerId::new("sub-1");
        registry.spawn(id.clone(), SubworkerConfig::new("m"), now());
        registry.transition(&id, Transition::Kill).unwrap();
        registry.remove(&id);
        assert!(registry.is_empty());
    }
}
