#![deny(missing_docs)]
//! Protocol traits and canonical wire types for the flo multi-agent
//! execution fabric.
//!
//! This crate defines the *shape* of the fabric, not any particular
//! implementation of it:
//!
//! - [`operator::Operator`] — the object-safe boundary an agentic loop implements.
//! - [`relay::Relay`] — the object-safe boundary the message bus implements.
//! - [`sandbox::SandboxEnvironment`] — the isolation boundary a sandbox document implements.
//! - [`state::StateStore`] / [`state::StateReader`] — the scoped key/value boundary.
//! - [`hook::Hook`] — the policy boundary evaluated around tool use and loop edges.
//! - [`content`], [`event`], [`effect`], [`error`], [`id`], [`duration`] — shared vocabulary.

pub mod content;
pub mod duration;
pub mod effect;
pub mod error;
pub mod event;
pub mod hook;
pub mod id;
pub mod operator;
pub mod relay;
pub mod sandbox;
pub mod state;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use content::{ContentBlock, Message, Role};
pub use duration::DurationMs;
pub use effect::{Effect, Scope, SignalPayload};
pub use error::{ErrorKind, FloError};
pub use event::{AgentEvent, BudgetEvent, CompactionEvent, StopReason};
pub use hook::{Hook, HookAction, HookContext, HookPoint};
pub use id::{AgentId, HubConnectionId, SubworkerId, WorkerId, WorkflowId};
pub use operator::{
    ExitReason, Operator, OperatorConfig, OperatorError, OperatorInput, OperatorMetadata,
    OperatorOutput, ToolCallRecord, TriggerType,
};
pub use relay::{Relay, RelayError, RelayQuery};
pub use sandbox::{HubProxyPatterns, NetworkPolicy, SandboxEnvironment, SandboxError, SandboxPermissions, SandboxSpec};
pub use state::{SearchResult, StateError, StateReader, StateStore};
