//! The hook boundary evaluated around tool use and loop boundaries.
//!
//! A hook never executes a tool itself; it observes (and may veto) the loop's
//! decision to execute one. See `flo-hooks` for the registry that dispatches
//! to a `Vec<Arc<dyn Hook>>` in order, and for the rule-matcher hook that
//! implements the matcher/action vocabulary from the design.

use crate::content::Message;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Where in the agentic loop a hook fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum HookPoint {
    /// Before the model stream for this turn begins.
    TurnStart,
    /// Before a tool call is executed.
    PreToolUse,
    /// After a tool call returns (success or error).
    PostToolUse,
    /// Before the loop stops (any exit reason).
    Stop,
}

/// Everything a hook needs to decide what to do.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct HookContext {
    /// Which point this invocation corresponds to.
    pub point: HookPoint,
    /// The tool name, for `PreToolUse`/`PostToolUse`.
    pub tool_name: Option<String>,
    /// The tool's input, for `PreToolUse`/`PostToolUse`.
    pub tool_input: Option<Value>,
    /// The tool's raw result text, for `PostToolUse`.
    pub tool_result: Option<String>,
    /// The model's output so far this turn, for `TurnStart`/`Stop`.
    pub model_output: Option<Message>,
    /// Tokens spent so far this run.
    pub tokens_used: u64,
    /// USD cost so far this run.
    pub cost: Decimal,
    /// Turns completed so far.
    pub turns_completed: u32,
}

impl HookContext {
    /// Build a bare context for the given point; every optional field starts empty.
    pub fn new(point: HookPoint) -> Self {
        Self {
            point,
            tool_name: None,
            tool_input: None,
            tool_result: None,
            model_output: None,
            tokens_used: 0,
            cost: Decimal::ZERO,
            turns_completed: 0,
        }
    }
}

/// What a hook decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
#[non_exhaustive]
pub enum HookAction {
    /// Proceed unchanged.
    Allow,
    /// Veto the tool call; it is converted to a synthetic error `ToolResult`, never executed.
    Deny {
        /// Why this was denied, surfaced in the synthetic error result.
        reason: String,
    },
    /// Proceed, but record this event (no effect on control flow).
    Log,
    /// Proceed, but replace the tool's input or output with a script-produced value.
    ///
    /// Scope: currently only meaningful at `PostToolUse`, to rewrite the
    /// result before it's appended to the conversation.
    Script {
        /// The replacement value.
        replacement: Value,
    },
}

/// Errors a hook can return from `on_event`.
///
/// Returning `Err` here does **not** halt the loop — it is logged and
/// treated as `HookAction::Allow`. Use `HookAction::Deny` to actually stop a
/// tool call from executing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HookError {
    /// The hook itself failed (a panic-free internal error, not a veto).
    #[error("hook failed: {0}")]
    Failed(String),
    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A policy rule evaluated at one or more [`HookPoint`]s.
///
/// Implementations: a regex/predicate rule hook (`flo-hooks::RuleHook`), a
/// redaction hook that scans tool output for secret-shaped substrings, a
/// budget-aware hook that denies once a soft threshold is crossed.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Which points this hook wants to be invoked at.
    fn points(&self) -> &[HookPoint];

    /// Evaluate this hook against the given context.
    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError>;
}
