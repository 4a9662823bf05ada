//! The object-safe dispatch boundary implemented by the message relay.
//!
//! This trait only names *what* the rest of the fabric needs from the relay
//! — dispatching to an agent, signalling a running workflow, querying it for
//! something like a DOM snapshot. The four-tier routing, correlation-id
//! bookkeeping, per-worker FIFO ordering, and capability-routing table that
//! make good on those calls live in `flo-relay`; calling code here doesn't
//! know (or care) whether `dispatch` resolved in-process or after a hop
//! through a sandbox document and back.

use crate::effect::SignalPayload;
use crate::id::{AgentId, WorkflowId};
use crate::operator::{OperatorError, OperatorInput, OperatorOutput};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from relay dispatch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RelayError {
    /// No agent registered under this id.
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    /// No running workflow under this id.
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),
    /// Dispatch itself failed (e.g. the task driving the agent panicked).
    #[error("dispatch failed: {0}")]
    DispatchFailed(String),
    /// A signal could not be delivered.
    #[error("signal failed: {0}")]
    SignalFailed(String),
    /// A correlated request expired before a response arrived.
    #[error("timeout")]
    Timeout,
    /// A correlated request was cancelled (explicit `stop_agent`, or shutdown).
    #[error("cancelled")]
    Cancelled,
    /// The target tool is not routable from the requesting context.
    #[error("policy: {0} is not routable from {1}")]
    NotRoutable(String, String),
    /// Propagated failure from the dispatched operator itself.
    #[error(transparent)]
    OperatorError(#[from] OperatorError),
    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A query sent to a running workflow (e.g. `captureDomState`).
#[derive(Debug, Clone)]
pub struct RelayQuery {
    /// What is being asked for.
    pub query_type: String,
    /// Parameters for the query.
    pub params: Value,
}

impl RelayQuery {
    /// Build a new query.
    pub fn new(query_type: impl Into<String>, params: Value) -> Self {
        Self {
            query_type: query_type.into(),
            params,
        }
    }
}

/// The dispatch boundary the rest of the fabric programs against.
///
/// Example implementations: an in-process relay that holds every worker as
/// a spawned task and a correlation table (`flo-relay::Relay`), and — for
/// tests — a relay that dispatches directly with no channel hop at all.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Dispatch one invocation to the named agent and await its result.
    async fn dispatch(
        &self,
        agent: &AgentId,
        input: OperatorInput,
    ) -> Result<OperatorOutput, RelayError>;

    /// Dispatch many invocations concurrently. Each is independent: one
    /// failing does not cancel the others. Results preserve input order.
    async fn dispatch_many(
        &self,
        tasks: Vec<(AgentId, OperatorInput)>,
    ) -> Vec<Result<OperatorOutput, RelayError>>;

    /// Deliver a fire-and-forget signal to a running workflow. "Accepted",
    /// not "processed" — the caller does not learn whether the target
    /// actually consumed it before the next suspension point.
    async fn signal(&self, target: &WorkflowId, signal: SignalPayload) -> Result<(), RelayError>;

    /// Query a running workflow for something only it can answer
    /// (`captureDomState`, listener snapshots).
    async fn query(&self, target: &WorkflowId, query: RelayQuery) -> Result<Value, RelayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn Relay) {}

    #[test]
    fn relay_query_new_sets_fields() {
        let q = RelayQuery::new("dom_snapshot", Value::Null);
        assert_eq!(q.query_type, "dom_snapshot");
    }

    #[test]
    fn not_routable_error_names_both_tool_and_context() {
        let err = RelayError::NotRoutable("bash".into(), "worker".into());
        assert_eq!(err.to_string(), "policy: bash is not routable from worker");
    }
}
