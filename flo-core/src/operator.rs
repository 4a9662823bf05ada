//! The object-safe boundary a worker's agentic loop implements.
//!
//! `Operator` is deliberately minimal — one method, one input, one output —
//! so that every concrete loop implementation (ReAct-style, single-shot,
//! a subworker's loop, a test double) is interchangeable behind `Arc<dyn
//! Operator>`. Everything provider-specific (the `Provider` RPITIT trait,
//! canonical request/response types) lives one layer up, in `flo-provider`,
//! because that trait is not object-safe and does not need to be: a concrete
//! loop is generic over its provider, but the relay only ever needs to hold
//! an `Operator` trait object.

use crate::content::Message;
use crate::effect::Effect;
use crate::event::StopReason;
use crate::id::WorkflowId;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

/// What triggered this invocation of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TriggerType {
    /// A user-authored message.
    User,
    /// A scheduled or programmatic task.
    Task,
    /// A signal delivered via `Effect::Signal` from another agent.
    Signal,
    /// A subagent's `agent_respond`.
    SubagentResponse,
    /// Escape hatch.
    Custom(String),
}

/// Per-invocation overrides layered onto an agent's static configuration.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct OperatorConfig {
    /// Hard cap on turns for this invocation.
    pub max_turns: Option<u32>,
    /// Hard cap on USD cost for this invocation.
    pub max_cost: Option<Decimal>,
    /// Model override for this invocation.
    pub model: Option<String>,
    /// Restrict tool availability to this set for this invocation.
    pub allowed_tools: Option<Vec<String>>,
    /// Extra text appended to the system prompt for this invocation.
    pub system_addendum: Option<String>,
}

/// Input to a single `Operator::execute` call.
#[non_exhaustive]
pub struct OperatorInput {
    /// The triggering message.
    pub message: Message,
    /// What triggered this run.
    pub trigger: TriggerType,
    /// The owning workflow, if this is a continuation of a running agent.
    pub workflow: Option<WorkflowId>,
    /// Per-invocation overrides.
    pub config: Option<OperatorConfig>,
    /// Free-form metadata (trace ids, hub-origin markers, etc).
    pub metadata: Value,
}

impl OperatorInput {
    /// Build a new input with no overrides and empty metadata.
    pub fn new(message: Message, trigger: TriggerType) -> Self {
        Self {
            message,
            trigger,
            workflow: None,
            config: None,
            metadata: Value::Null,
        }
    }
}

/// Why a loop run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExitReason {
    /// Matches [`StopReason::EndTurn`] — the model finished with no pending tool use.
    Complete,
    /// The configured turn limit was hit.
    MaxTurns,
    /// The cost or token budget was exhausted.
    BudgetExhausted,
    /// A hook or the caller requested a stop (`stop_agent`).
    Cancelled,
    /// A stream-level or tool-level error the loop could not recover from.
    Error,
    /// A hook vetoed continuation at `HookPoint::Stop` with a reason.
    ObserverHalt {
        /// The hook's stated reason.
        reason: String,
    },
    /// Escape hatch.
    Custom(String),
}

impl ExitReason {
    /// The [`StopReason`] this maps onto for event emission.
    pub fn to_stop_reason(&self) -> StopReason {
        match self {
            ExitReason::Complete => StopReason::EndTurn,
            ExitReason::MaxTurns => StopReason::MaxTurns,
            ExitReason::BudgetExhausted
            | ExitReason::Cancelled
            | ExitReason::Error
            | ExitReason::ObserverHalt { .. }
            | ExitReason::Custom(_) => StopReason::Error,
        }
    }
}

/// A record of one tool call made during a run, for metadata/telemetry.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Tool name.
    pub name: String,
    /// Whether it succeeded.
    pub success: bool,
}

impl ToolCallRecord {
    /// Build a new record.
    pub fn new(name: impl Into<String>, success: bool) -> Self {
        Self {
            name: name.into(),
            success,
        }
    }
}

/// Accounting for one `execute` call.
#[derive(Debug, Clone)]
pub struct OperatorMetadata {
    /// Prompt tokens consumed.
    pub tokens_in: u64,
    /// Completion tokens consumed.
    pub tokens_out: u64,
    /// USD cost incurred.
    pub cost: Decimal,
    /// Turns actually taken.
    pub turns_used: u32,
    /// Every tool call made, in order.
    pub tools_called: Vec<ToolCallRecord>,
}

impl Default for OperatorMetadata {
    fn default() -> Self {
        Self {
            tokens_in: 0,
            tokens_out: 0,
            cost: Decimal::ZERO,
            turns_used: 0,
            tools_called: Vec::new(),
        }
    }
}

/// Output of a single `Operator::execute` call.
#[non_exhaustive]
pub struct OperatorOutput {
    /// The final assistant message produced.
    pub message: Message,
    /// Why the run stopped.
    pub exit_reason: ExitReason,
    /// Accounting for the run.
    pub metadata: OperatorMetadata,
    /// Effects the caller should schedule (state writes, signals, delegation).
    pub effects: Vec<Effect>,
}

impl OperatorOutput {
    /// Build a new output with no effects.
    pub fn new(message: Message, exit_reason: ExitReason, metadata: OperatorMetadata) -> Self {
        Self {
            message,
            exit_reason,
            metadata,
            effects: Vec::new(),
        }
    }
}

/// Errors an [`Operator`] can return.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OperatorError {
    /// The provider rejected or failed the request.
    #[error("model error: {0}")]
    Model(String),
    /// A tool execution failed in a way the loop could not route around.
    #[error("tool {tool} failed: {message}")]
    Tool {
        /// Which tool.
        tool: String,
        /// What went wrong.
        message: String,
    },
    /// Prompt assembly failed (e.g. a skill dependency could not be resolved).
    #[error("context assembly failed: {0}")]
    ContextAssembly(String),
    /// A retryable transient failure (caller may retry with backoff).
    #[error("retryable: {0}")]
    Retryable(String),
    /// A non-retryable failure.
    #[error("{0}")]
    NonRetryable(String),
    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The object-safe boundary every agentic loop implementation satisfies.
///
/// Implementations: a ReAct-style loop (`flo-loop::ReactOperator`), a
/// single-shot loop with no tool use, and test doubles that echo input back.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Run one invocation through to a stop condition.
    async fn execute(&self, input: OperatorInput) -> Result<OperatorOutput, OperatorError>;
}
