//! Effects an [`crate::operator::Operator`] declares rather than executes.
//!
//! An operator's [`crate::operator::OperatorOutput`] carries a list of
//! `Effect`s instead of performing them directly — writing state, emitting a
//! signal to another worker, or spawning a subworker are all decisions the
//! *caller* (the relay, ultimately the supervisor) gets to schedule. This
//! keeps the loop's business logic testable without a live relay: a test can
//! assert on the returned effects without wiring up channels.

use crate::id::{AgentId, WorkflowId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a piece of state lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Scope {
    /// State private to one running agent instance.
    Workflow(WorkflowId),
    /// State private to one subworker within a workflow.
    Agent {
        /// The owning workflow.
        workflow: WorkflowId,
        /// The agent (sub)worker.
        agent: AgentId,
    },
    /// Shared across every agent (hub-wide settings, for example).
    Global,
    /// Escape hatch for scopes not otherwise named here.
    Custom(String),
}

/// A signal delivered to another worker (backs `flo.notify` / `agent_notify`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalPayload {
    /// Event name, as passed to `flo.notify`.
    pub signal_type: String,
    /// Event payload.
    pub data: Value,
}

impl SignalPayload {
    /// Build a new signal payload.
    pub fn new(signal_type: impl Into<String>, data: Value) -> Self {
        Self {
            signal_type: signal_type.into(),
            data,
        }
    }
}

/// A log severity, carried by [`Effect::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Diagnostic detail.
    Trace,
    /// Developer-facing detail.
    Debug,
    /// Normal operation.
    Info,
    /// Recoverable anomaly.
    Warn,
    /// Failure.
    Error,
}

/// An effect an operator declares for its caller to carry out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Effect {
    /// Write a value into scoped state (backs `flo.state.set` / `flo.storage.set`).
    WriteMemory {
        /// Where to write.
        scope: Scope,
        /// Key within the scope.
        key: String,
        /// Value to store.
        value: Value,
    },
    /// Delete a key from scoped state (backs `flo.storage.delete`).
    DeleteMemory {
        /// Where to delete from.
        scope: Scope,
        /// Key to remove.
        key: String,
    },
    /// Emit a signal to another workflow (backs `agent_notify` across agents).
    Signal {
        /// Target workflow.
        target: WorkflowId,
        /// The signal itself.
        payload: SignalPayload,
    },
    /// Spawn a subworker (backs the `subagent` tool / `spawn_subworker`).
    Delegate {
        /// The subworker to create.
        agent: AgentId,
        /// Its initial input.
        input: Box<crate::operator::OperatorInput>,
    },
    /// Hand conversation state off to another agent without starting it immediately.
    Handoff {
        /// Receiving agent.
        agent: AgentId,
        /// Opaque state blob.
        state: Value,
    },
    /// Structured log line.
    Log {
        /// Severity.
        level: LogLevel,
        /// Message text.
        message: String,
        /// Optional structured data.
        data: Option<Value>,
    },
    /// Escape hatch for effect kinds not otherwise named here.
    Custom {
        /// Effect discriminant.
        effect_type: String,
        /// Effect payload.
        data: Value,
    },
}
