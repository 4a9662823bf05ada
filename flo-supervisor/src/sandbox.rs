//! `LocalSandbox`: the in-process [`SandboxEnvironment`] implementation.
//!
//! Runs an [`Operator`] with no isolation beyond the task boundary — no
//! separate process, no WASM. Appropriate for trusted, first-party agents
//! and for tests; a hardened deployment substitutes a different
//! `SandboxEnvironment` implementation without anything above this trait
//! noticing the difference.

use async_trait::async_trait;
use flo_core::error::{ErrorKind, FloError};
use flo_core::operator::{Operator, OperatorInput, OperatorOutput};
use flo_core::sandbox::{NetworkPolicy, SandboxEnvironment, SandboxError, SandboxSpec};
use std::sync::Arc;

/// Runs an operator in-process, enforcing only the network policy a tool's
/// own outbound request declares — `LocalSandbox` does not intercept
/// sockets itself (that's the Request Interceptor's job per the external
/// interfaces); it exists so callers with no tool that performs network
/// I/O still get useful construction-time validation of `SandboxSpec`.
pub struct LocalSandbox {
    operator: Arc<dyn Operator>,
}

impl LocalSandbox {
    /// Build a sandbox around the given operator.
    pub fn new(operator: Arc<dyn Operator>) -> Self {
        Self { operator }
    }

    /// Validate that `host` is permitted under `spec`'s network policy,
    /// without performing any I/O. Tools that open their own connections
    /// call this before dialing out.
    pub fn check_egress(spec: &SandboxSpec, host: &str) -> Result<(), SandboxError> {
        if spec.network.permits(host) {
            Ok(())
        } else {
            Err(SandboxError::PolicyViolation(format!("{host} is not permitted by the configured network policy")))
        }
    }
}

#[async_trait]
impl SandboxEnvironment for LocalSandbox {
    async fn run(&self, input: OperatorInput, _spec: &SandboxSpec) -> Result<OperatorOutput, SandboxError> {
        self.operator.execute(input).await.map_err(SandboxError::from)
    }
}

impl From<SandboxError> for FloError {
    fn from(err: SandboxError) -> Self {
        let kind = match &err {
            SandboxError::ConstructionFailed(_) => ErrorKind::Internal,
            SandboxError::PolicyViolation(_) => ErrorKind::Policy,
            SandboxError::OperatorError(_) => ErrorKind::Internal,
            SandboxError::Other(_) => ErrorKind::Internal,
        };
        FloError::new(kind, err.to_string())
    }
}
