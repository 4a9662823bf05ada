#![deny(missing_docs)]
//! The per-agent agentic loop.
//!
//! [`operator::ReactOperator`] is the [`flo_core::operator::Operator`]
//! implementation that drives one turn: stream a provider response, run
//! effect tools and externally-routed tools through a
//! [`tool_exec::ToolExecutor`], evaluate [`flo_hooks::HookRegistry`] at each
//! loop edge, compact context via a [`context::ContextStrategy`] when the
//! window fills, and stop on budget exhaustion, a terminal hook decision,
//! or the model's own completion.
//!
//! - [`config::LoopConfig`] / [`config::ResolvedConfig`] — static defaults
//!   and their per-invocation resolution.
//! - [`context`] — client-side context-window compaction.
//! - [`effects`] — the five built-in effect tools every agent can call.
//! - [`tool_exec::ToolExecutor`] — the seam to externally-routed tools.
//! - [`transport::ApiTransport`] — the seam to HTTP egress.
//! - [`operator::ReactOperator`] — ties the above into one `Operator`.

pub mod config;
pub mod context;
pub mod effects;
pub mod operator;
pub mod tool_exec;
pub mod transport;

pub use config::{LoopConfig, ResolvedConfig};
pub use context::{ContextStrategy, NoCompaction, SlidingWindow};
pub use effects::{build_effect, effect_tool_schemas, is_effect_tool, parse_scope, EFFECT_TOOL_NAMES};
pub use operator::ReactOperator;
pub use tool_exec::{NoTools, ToolExecutor};
pub use transport::ApiTransport;
