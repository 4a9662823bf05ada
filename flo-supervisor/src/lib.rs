#![deny(missing_docs)]
//! Owns one agent's sandbox document, subworker registry, and lifecycle
//! state, and the root registry that tracks every live agent in a process.
//!
//! - [`config::AgentConfig`] — the mutable per-agent configuration record.
//! - [`lifecycle::SupervisorState`] — the six-state lifecycle and its transition table.
//! - [`budget::BudgetAccumulator`] — running token/cost totals and budget checks.
//! - [`subworker::SubworkerRegistry`] — nested subworker bookkeeping.
//! - [`sandbox::LocalSandbox`] — the in-process [`flo_core::sandbox::SandboxEnvironment`].
//! - [`storage::StorageProvider`] / [`persistence::PersistenceLayer`] — external collaborator traits.
//! - [`supervisor::AgentSupervisor`] — ties the above together for one agent.
//! - [`manager::AgentManager`] — the root registry of live supervisors.

pub mod budget;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod persistence;
pub mod sandbox;
pub mod storage;
pub mod subworker;
pub mod supervisor;

pub use budget::{BudgetAccumulator, BudgetOutcome};
pub use config::{AgentConfig, ConfigUpdate};
pub use error::SupervisorError;
pub use lifecycle::{InvalidTransition, SupervisorState, Transition};
pub use manager::AgentManager;
pub use persistence::{AgentMetadata, AgentRegistryEntry, ExportBundle, PersistenceError, PersistenceLayer};
pub use sandbox::LocalSandbox;
pub use storage::{DirEntry, StorageError, StorageProvider};
pub use subworker::{SubworkerConfig, SubworkerRecord, SubworkerRegistry};
pub use supervisor::AgentSupervisor;
