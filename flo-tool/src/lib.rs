#![deny(missing_docs)]
//! The tool registry.
//!
//! A tool name maps to exactly one [`DispatchSite`] — this is the concrete
//! table the capability-routing design calls for: explicit and
//! table-driven, not a conditional cascade. Tools whose body runs
//! worker-local (no relay round-trip needed, e.g. arithmetic) implement
//! [`ToolDyn`] directly; tools resident in the sandbox document or the
//! supervisor are represented the same way one layer up (`flo-supervisor`,
//! `flo-hub`) and registered here purely for their name/schema/site so the
//! loop can validate a call before it ever reaches the relay.

pub mod builtin;

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors from tool lookup or execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolError {
    /// No tool registered under this name.
    #[error("tool not found: {0}")]
    NotFound(String),
    /// The tool ran but failed.
    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),
    /// The supplied input didn't match the tool's schema/expectations.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The tool was invoked from a context it isn't routable from.
    #[error("{tool} is not routable from {site}")]
    NotRoutable {
        /// Tool name.
        tool: String,
        /// The context it was invoked from.
        site: String,
    },
    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Which execution context a tool's body runs in.
///
/// This is the capability-routing table's value type: a tool name maps to
/// exactly one of these, set once at registration and never inferred from
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchSite {
    /// Runs directly inside the worker driving the agentic loop — no relay hop.
    WorkerLocal,
    /// Runs inside the sandbox document (DOM/page-API access).
    SandboxDocument,
    /// Runs in the supervisor's plugin registry, optionally forwarded to a Hub.
    Supervisor,
}

impl std::fmt::Display for DispatchSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DispatchSite::WorkerLocal => "worker",
            DispatchSite::SandboxDocument => "sandbox",
            DispatchSite::Supervisor => "supervisor",
        };
        f.write_str(s)
    }
}

/// A future-returning, object-safe tool body.
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>>;

/// An object-safe tool, callable with a JSON input and returning a JSON result.
pub trait ToolDyn: Send + Sync {
    /// The tool's registered name.
    fn name(&self) -> &str;

    /// Human-readable description surfaced to the model.
    fn description(&self) -> &str;

    /// JSON Schema describing valid input.
    fn input_schema(&self) -> Value;

    /// Where this tool's body executes.
    fn dispatch_site(&self) -> DispatchSite;

    /// Whether this tool is safe to run concurrently with other tool calls
    /// in the same turn (no shared mutable state, no ordering dependency).
    /// The agentic loop parallelizes only tools the registry marks as such.
    fn side_effect_free(&self) -> bool {
        false
    }

    /// Execute the tool against the given input.
    fn call(&self, input: Value) -> ToolFuture<'_>;
}

/// The in-process tool registry: name → handler + site.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, overwriting any previous registration under the same name.
    pub fn register(&mut self, tool: Arc<dyn ToolDyn>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolDyn>> {
        self.tools.get(name)
    }

    /// Iterate over every registered tool.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ToolDyn>> {
        self.tools.values()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// A registry pre-populated with every built-in worker-local tool.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(Arc::new(builtin::RunJs));
        reg
    }

    /// Call a tool by name, validating it is routable from `caller_site`
    /// before executing it. A mismatch is rejected with a typed error,
    /// never silently dispatched to the wrong context.
    pub async fn call(
        &self,
        name: &str,
        input: Value,
        caller_site: DispatchSite,
    ) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        if tool.dispatch_site() != caller_site {
            return Err(ToolError::NotRoutable {
                tool: name.to_string(),
                site: caller_site.to_string(),
            });
        }
        tool.call(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;
    impl ToolDyn for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes input"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        fn dispatch_site(&self) -> DispatchSite {
            DispatchSite::WorkerLocal
        }
        fn side_effect_free(&self) -> bool {
            true
        }
        fn call(&self, input: Value) -> ToolFuture<'_> {
            Box::pin(async move { Ok(input) })
        }
    }

    struct FailTool;
    impl ToolDyn for FailTool {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        fn input_schema(&self) -> Value {
            Value::Null
        }
        fn dispatch_site(&self) -> DispatchSite {
            DispatchSite::Supervisor
        }
        fn call(&self, _input: Value) -> ToolFuture<'_> {
            Box::pin(async move { Err(ToolError::ExecutionFailed("nope".into())) })
        }
    }

    fn _assert_object_safe(_: Arc<dyn ToolDyn>) {}

    #[tokio::test]
    async fn registry_add_and_get() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        assert!(reg.get("echo").is_some());
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test]
    async fn registry_call_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        let result = reg
            .call("echo", serde_json::json!({"x": 1}), DispatchSite::WorkerLocal)
            .await
            .unwrap();
        assert_eq!(result["x"], 1);
    }

    #[tokio::test]
    async fn registry_call_missing_tool() {
        let reg = ToolRegistry::new();
        let err = reg.call("nope", Value::Null, DispatchSite::WorkerLocal).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn registry_rejects_call_from_wrong_site() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(FailTool)); // registered as Supervisor
        let err = reg
            .call("fail", Value::Null, DispatchSite::WorkerLocal)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotRoutable { .. }));
    }

    #[tokio::test]
    async fn registry_call_failing_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(FailTool));
        let err = reg.call("fail", Value::Null, DispatchSite::Supervisor).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed(_)));
    }

    #[tokio::test]
    async fn registry_overwrite_replaces_previous_registration() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        reg.register(Arc::new(EchoTool));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn dispatch_site_display_matches_relay_vocabulary() {
        assert_eq!(DispatchSite::WorkerLocal.to_string(), "worker");
        assert_eq!(DispatchSite::SandboxDocument.to_string(), "sandbox");
        assert_eq!(DispatchSite::Supervisor.to_string(), "supervisor");
    }

    #[tokio::test]
    async fn with_builtins_registers_runjs() {
        let reg = ToolRegistry::with_builtins();
        assert!(reg.get("runjs").is_some());
    }
}
