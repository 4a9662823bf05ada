//! The sandbox-document isolation boundary.
//!
//! A [`SandboxEnvironment`] is responsible for actually running an
//! [`crate::operator::Operator`] inside whatever isolation its implementation
//! provides — nothing more, nothing less. The local implementation
//! (`flo-supervisor::LocalSandbox`) runs the operator in-process with no
//! additional isolation beyond the task boundary; a hardened implementation
//! could run it in a separate process or a WASM sandbox without changing
//! anything above this trait.

use crate::operator::{OperatorError, OperatorInput, OperatorOutput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which egress policy a sandboxed agent is bound by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum NetworkPolicy {
    /// No restriction; every request is permitted (subject to the interceptor's routing).
    AllowAll,
    /// Only requests whose host matches an entry in `domains` are permitted.
    Allowlist {
        /// Permitted hosts.
        domains: Vec<String>,
    },
    /// Requests whose host matches an entry in `domains` are rejected; all others pass.
    Blocklist {
        /// Forbidden hosts.
        domains: Vec<String>,
    },
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        NetworkPolicy::AllowAll
    }
}

impl NetworkPolicy {
    /// Whether a request to `host` is permitted under this policy.
    pub fn permits(&self, host: &str) -> bool {
        match self {
            NetworkPolicy::AllowAll => true,
            NetworkPolicy::Allowlist { domains } => domains.iter().any(|d| d == host),
            NetworkPolicy::Blocklist { domains } => !domains.iter().any(|d| d == host),
        }
    }
}

/// Browser-permission-style capability flags granted to the sandbox document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxPermissions {
    /// Camera capture permitted.
    pub camera: bool,
    /// Microphone capture permitted.
    pub microphone: bool,
    /// Geolocation queries permitted.
    pub geolocation: bool,
}

/// Optional patterns routed through the Hub rather than directly, when a hub
/// connection is configured for this agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubProxyPatterns {
    /// URL-glob patterns (e.g. `"https://api.example.com/*"`) routed via the hub.
    pub patterns: Vec<String>,
}

/// Declarative description of the isolation a sandbox document should provide.
///
/// Mirrors `AgentConfig`'s `networkPolicy` and `sandboxPermissions` fields:
/// this is the part of an agent's configuration that only matters at sandbox
/// construction time (permission changes take effect on next recreation, not
/// live).
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct SandboxSpec {
    /// Egress policy for this agent.
    pub network: NetworkPolicy,
    /// Granted capability flags.
    pub permissions: SandboxPermissions,
    /// Hub-proxy routing patterns, if a hub connection is attached.
    pub hub_proxy: HubProxyPatterns,
}

/// Errors from constructing or running inside a sandbox.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SandboxError {
    /// The sandbox document itself could not be constructed.
    #[error("sandbox construction failed: {0}")]
    ConstructionFailed(String),
    /// A network request violated the configured policy.
    #[error("network policy violation: {0}")]
    PolicyViolation(String),
    /// Propagated failure from the operator running inside the sandbox.
    #[error(transparent)]
    OperatorError(#[from] OperatorError),
    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Runs an [`crate::operator::Operator`] inside some isolation boundary.
///
/// Example implementations: `LocalSandbox` (no isolation beyond the task
/// boundary — appropriate for trusted, first-party agents and for tests),
/// a process-per-agent sandbox, a WASM-sandboxed one.
#[async_trait]
pub trait SandboxEnvironment: Send + Sync {
    /// Run one invocation inside this sandbox's isolation.
    async fn run(
        &self,
        input: OperatorInput,
        spec: &SandboxSpec,
    ) -> Result<OperatorOutput, SandboxError>;
}
