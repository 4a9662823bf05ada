//! Shared event vocabulary.
//!
//! These are not a trait — there is no separate "event service". Emitting
//! and routing events is the relay's and supervisor's job; this module only
//! defines what an event *is* so every layer agrees on the shape.

use crate::duration::DurationMs;
use crate::id::{AgentId, WorkflowId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reason the agentic loop stopped, echoed on `AgentEvent::TurnEnd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StopReason {
    /// The model produced a final answer with no pending tool use.
    EndTurn,
    /// The turn ended because the model requested tool use (more turns follow).
    ToolUse,
    /// The configured turn limit was reached.
    MaxTurns,
    /// A stream-level or tool-level error occurred; the loop yielded.
    Error,
}

/// The discriminated union of everything a worker or adapter can emit.
///
/// This is the wire shape for `AgentEvent` from the data model: one variant
/// per event name, each carrying exactly the fields that event needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum AgentEvent {
    /// An incremental chunk of assistant text.
    TextDelta {
        /// The agent this event belongs to.
        agent: AgentId,
        /// The text fragment.
        text: String,
    },
    /// The current text block is complete.
    TextDone {
        /// The agent this event belongs to.
        agent: AgentId,
    },
    /// A tool-use block has started accumulating.
    ToolUseStart {
        /// The agent this event belongs to.
        agent: AgentId,
        /// Correlation id for the eventual `ToolUseDone`/`ToolResult`.
        id: String,
        /// Tool name.
        name: String,
    },
    /// An incremental chunk of a tool call's JSON input.
    ToolUseInputDelta {
        /// The agent this event belongs to.
        agent: AgentId,
        /// Matching `ToolUseStart::id`.
        id: String,
        /// Partial JSON fragment.
        delta: String,
    },
    /// A tool-use block's input is fully assembled.
    ToolUseDone {
        /// The agent this event belongs to.
        agent: AgentId,
        /// Matching `ToolUseStart::id`.
        id: String,
        /// The fully assembled input.
        input: Value,
    },
    /// A tool call's result has been correlated back.
    ToolResult {
        /// The agent this event belongs to.
        agent: AgentId,
        /// Matching `ToolUseStart::id`.
        id: String,
        /// Rendered result content.
        content: String,
        /// Whether the tool execution failed.
        is_error: bool,
    },
    /// Token/cost usage reported for this turn.
    Usage {
        /// The agent this event belongs to.
        agent: AgentId,
        /// Prompt tokens.
        input_tokens: u64,
        /// Completion tokens.
        output_tokens: u64,
        /// Incremental USD cost for this turn.
        cost: Decimal,
    },
    /// The current turn has ended.
    TurnEnd {
        /// The agent this event belongs to.
        agent: AgentId,
        /// Why the turn ended.
        stop_reason: StopReason,
    },
    /// A stream- or tool-level error occurred.
    Error {
        /// The agent this event belongs to.
        agent: AgentId,
        /// Error kind tag (mirrors [`crate::error::ErrorKind`]).
        kind: String,
        /// Human-readable message.
        message: String,
    },
    /// The supervisor's lifecycle state changed.
    StateChange {
        /// The agent this event belongs to.
        agent: AgentId,
        /// New state name.
        state: String,
        /// Optional reason (e.g. `"budget"`, `"cancelled"`).
        reason: Option<String>,
    },
    /// The agent's `viewState` (arbitrary UI-owned blob) changed.
    ViewStateChange {
        /// The agent this event belongs to.
        agent: AgentId,
        /// New view state.
        view_state: Value,
    },
    /// The agent's visibility in the surrounding UI changed.
    VisibilityChange {
        /// The agent this event belongs to.
        agent: AgentId,
        /// `true` if now visible.
        visible: bool,
    },
}

impl AgentEvent {
    /// The agent every variant is tagged with.
    pub fn agent(&self) -> &AgentId {
        match self {
            AgentEvent::TextDelta { agent, .. }
            | AgentEvent::TextDone { agent }
            | AgentEvent::ToolUseStart { agent, .. }
            | AgentEvent::ToolUseInputDelta { agent, .. }
            | AgentEvent::ToolUseDone { agent, .. }
            | AgentEvent::ToolResult { agent, .. }
            | AgentEvent::Usage { agent, .. }
            | AgentEvent::TurnEnd { agent, .. }
            | AgentEvent::Error { agent, .. }
            | AgentEvent::StateChange { agent, .. }
            | AgentEvent::ViewStateChange { agent, .. }
            | AgentEvent::VisibilityChange { agent, .. } => agent,
        }
    }
}

/// A budget-related decision, reported as an `Effect::Log`-adjacent signal
/// by the loop so the supervisor can transition state without re-deriving
/// the accumulator itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum BudgetEvent {
    /// A single turn's cost, and the running total.
    CostIncurred {
        /// The agent this applies to.
        agent: AgentId,
        /// This turn's incremental cost.
        cost: Decimal,
        /// Cumulative cost so far.
        cumulative: Decimal,
    },
    /// The budget has been exceeded; the loop should stop after the current turn.
    BudgetExhausted {
        /// The owning workflow.
        workflow: WorkflowId,
        /// Amount spent.
        spent: Decimal,
        /// The configured limit.
        limit: Decimal,
    },
}

/// Context-window pressure signals, consumed by a `ContextStrategy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum CompactionEvent {
    /// The assembled conversation is approaching the model's usable window.
    ContextPressure {
        /// The agent this applies to.
        agent: AgentId,
        /// Fraction of the window in use, 0.0-1.0.
        fill_percent: f64,
        /// Estimated tokens in use.
        tokens_used: u64,
        /// Estimated tokens available.
        tokens_available: u64,
    },
    /// Compaction ran and freed space.
    CompactionComplete {
        /// The agent this applies to.
        agent: AgentId,
        /// Name of the strategy that ran.
        strategy: String,
        /// Estimated tokens freed.
        tokens_freed: u64,
    },
}

/// Which layer produced an [`AgentEvent`] (or [`BudgetEvent`]/[`CompactionEvent`]), for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EventSource {
    /// The agentic loop.
    Loop,
    /// The relay / message bus.
    Relay,
    /// State storage.
    State,
    /// The sandbox environment.
    Sandbox,
    /// A hook.
    Hook,
}

/// Elapsed-time-stamped wrapper used when an event needs to be queued or replayed.
#[derive(Debug, Clone)]
pub struct TimestampedEvent<E> {
    /// The event itself.
    pub event: E,
    /// Elapsed time since the owning run started.
    pub elapsed: DurationMs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_event_serde_tag_is_type() {
        let event = AgentEvent::TurnEnd {
            agent: AgentId::new("a1"),
            stop_reason: StopReason::EndTurn,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "turn_end");
        assert_eq!(json["stop_reason"], "end_turn");
    }

    #[test]
    fn agent_accessor_returns_the_tagged_agent() {
        let event = AgentEvent::TextDelta {
            agent: AgentId::new("a1"),
            text: "hi".into(),
        };
        assert_eq!(event.agent().as_str(), "a1");
    }

    #[test]
    fn stop_reason_tool_use_round_trips() {
        let json = serde_json::to_string(&StopReason::ToolUse).unwrap();
        assert_eq!(json, "\"tool_use\"");
    }
}
