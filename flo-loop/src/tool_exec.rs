//! The seam between the loop and wherever a tool's body actually runs.
//!
//! The loop only ever needs two things from the rest of the fabric: the
//! schemas to advertise to the model, and a way to call a tool by name. It
//! does not need to know whether a given tool runs worker-local, in the
//! sandbox document, or in the supervisor — [`ToolExecutor`] hides that
//! capability-routing decision behind one call. `flo-supervisor` provides
//! the concrete implementation, consulting `flo_tool::ToolRegistry` and
//! `flo_relay::CapabilityRouter` to decide where each call actually goes.

use flo_provider::ToolSpec;
use flo_tool::ToolError;
use serde_json::Value;

/// Calls tools by name on the loop's behalf.
pub trait ToolExecutor: Send + Sync {
    /// Every tool's schema, to advertise to the model alongside the
    /// built-in effect tools.
    fn tool_specs(&self) -> Vec<ToolSpec>;

    /// Call a tool with the given input, returning a future boxed for
    /// object safety (mirrors `flo_tool::ToolDyn::call`).
    fn call<'a>(
        &'a self,
        name: &'a str,
        input: Value,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Value, ToolError>> + Send + 'a>>;
}

/// A [`ToolExecutor`] exposing no tools at all. Useful as a default for
/// agents configured with none, and in unit tests that only exercise
/// built-in effect tools.
pub struct NoTools;

impl ToolExecutor for NoTools {
    fn tool_specs(&self) -> Vec<ToolSpec> {
        Vec::new()
    }

    fn call<'a>(
        &'a self,
        name: &'a str,
        _input: Value,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Value, ToolError>> + Send + 'a>> {
        let name = name.to_string();
        Box::pin(async move { Err(ToolError::NotFound(name)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_tools_reports_every_call_as_not_found() {
        let exec = NoTools;
        assert!(exec.tool_specs().is_empty());
        let err = exec.call("anything", Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
