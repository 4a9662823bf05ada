#![deny(missing_docs)]
//! The four-tier message relay.
//!
//! Four tiers sit between a model turn and the outside world: Worker →
//! Sandbox Document → Supervisor → external/Hub. This crate implements the
//! in-process version of that relay — every worker is a spawned task
//! reachable by [`flo_core::id::AgentId`], correlated requests (tool calls,
//! DOM queries, file/state operations) are tracked by [`CorrelationTable`],
//! and a tool name resolves to exactly one reachable [`flo_tool::DispatchSite`]
//! via [`CapabilityRouter`]. Nothing above [`flo_core::relay::Relay`] needs to
//! know any of this — it dispatches and awaits a result.

pub mod correlation;
pub mod message;
pub mod relay;
pub mod router;
pub mod sandbox_handle;

pub use correlation::{await_correlated, default_timeout, CorrelationFailure, CorrelationTable};
pub use relay::{InProcessRelay, NoQueries, QueryHandler};
pub use router::{CapabilityRouter, RouteDenial};
pub use sandbox_handle::SandboxHandle;
