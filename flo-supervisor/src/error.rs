//! The supervisor's unified error type.
//!
//! Aggregates the lifecycle, relay, sandbox, storage, and persistence
//! error types a supervisor operation can surface, and converts into
//! [`FloError`] for callers that only need the coarse kind.

use crate::lifecycle::InvalidTransition;
use crate::persistence::PersistenceError;
use crate::storage::StorageError;
use crate::subworker::SubworkerTransitionError;
use flo_core::error::{ErrorKind, FloError};
use flo_core::relay::RelayError;
use flo_core::sandbox::SandboxError;
use thiserror::Error;

/// Errors an [`crate::supervisor::AgentSupervisor`] operation can return.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SupervisorError {
    /// The requested lifecycle transition is not valid from the current state.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// A subworker registry operation failed.
    #[error(transparent)]
    Subworker(#[from] SubworkerTransitionError),
    /// The relay could not deliver to or dispatch this agent's worker.
    #[error(transparent)]
    Relay(#[from] RelayError),
    /// The sandbox environment failed to construct or run.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    /// A Storage Provider call failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A Persistence Layer call failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// The agent's token or cost budget has been exhausted.
    #[error("budget exhausted for agent {0}")]
    BudgetExhausted(String),
    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<SupervisorError> for FloError {
    fn from(err: SupervisorError) -> Self {
        let kind = match &err {
            SupervisorError::InvalidTransition(_) | SupervisorError::Subworker(_) => ErrorKind::Config,
            SupervisorError::Relay(_) => ErrorKind::Internal,
            SupervisorError::Sandbox(_) => ErrorKind::Internal,
            SupervisorError::Storage(_) | SupervisorError::Persistence(_) => ErrorKind::Internal,
            SupervisorError::BudgetExhausted(_) => ErrorKind::Budget,
            SupervisorError::Other(_) => ErrorKind::Internal,
        };
        FloError::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{SupervisorState, Transition};

    #[test]
    fn invalid_transition_maps_to_config_kind() {
        let err = SupervisorState::Pending.apply(Transition::Stop).unwrap_err();
        let supervisor_err: SupervisorError = err.into();
        let flo_err: FloError = supervisor_err.into();
        assert_eq!(flo_err.kind(), "config");
    }

    #[test]
    fn budget_exhausted_maps_to_budget_kind() {
        let err = SupervisorError::BudgetExhausted("a1".into());
        let flo_err: FloError = err.into();
        assert_eq!(flo_err.kind(), "budget");
    }
}
