//! The capability-routing table: tool name → exactly one [`DispatchSite`].
//!
//! Mirrors `flo_tool::ToolRegistry`'s own routing check, but at the relay
//! tier: the registry answers "where does this tool's body run", and the
//! router answers "is the *caller's* site allowed to reach that site at
//! all" — a worker may call a worker-local tool directly with no relay hop,
//! but a sandbox-document-resident tool or a supervisor-resident tool must
//! be reached by dispatching up the tier. Table-driven, not conditional: the
//! allowed-caller-sites for a given target site are fixed ahead of time and
//! never inferred per call.

use flo_tool::{DispatchSite, ToolRegistry};
use std::collections::HashSet;

/// Decides whether a tool call may cross from one tier to another.
///
/// The four-tier relay is Worker → Sandbox Document → Supervisor →
/// external/Hub. A worker can always reach its own sandbox document and,
/// through it, the supervisor; the sandbox document and the supervisor can
/// each reach the tier directly below for a response, but never skip a tier.
pub struct CapabilityRouter {
    registry: ToolRegistry,
}

/// Why a routing decision was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDenial {
    /// No tool registered under this name.
    UnknownTool(String),
    /// The tool exists, but not reachable from the given caller site.
    NotRoutable {
        /// Tool name.
        tool: String,
        /// The tool's actual dispatch site.
        site: DispatchSite,
        /// The site the call originated from.
        from: DispatchSite,
    },
}

impl std::fmt::Display for RouteDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteDenial::UnknownTool(name) => write!(f, "tool not found: {name}"),
            RouteDenial::NotRoutable { tool, site, from } => {
                write!(f, "{tool} (routed to {site}) is not reachable from {from}")
            }
        }
    }
}

impl std::error::Error for RouteDenial {}

impl CapabilityRouter {
    /// Build a router backed by the given tool registry.
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Which [`DispatchSite`]s may call into `target`, per the tiered relay.
    fn allowed_callers(target: DispatchSite) -> HashSet<DispatchSite> {
        match target {
            // A worker-local tool only ever runs in the calling worker itself.
            DispatchSite::WorkerLocal => [DispatchSite::WorkerLocal].into_iter().collect(),
            // Sandbox-document tools are reachable from the worker they host,
            // and from the supervisor relaying a response back down.
            DispatchSite::SandboxDocument => {
                [DispatchSite::WorkerLocal, DispatchSite::Supervisor].into_iter().collect()
            }
            // Supervisor-resident tools are reachable from the sandbox
            // document tier (the only thing a worker can address upward
            // through) and the supervisor itself (hub-forwarded calls).
            DispatchSite::Supervisor => {
                [DispatchSite::SandboxDocument, DispatchSite::Supervisor].into_iter().collect()
            }
        }
    }

    /// Resolve `tool_name`'s dispatch site and confirm `caller_site` may
    /// reach it, without executing anything.
    pub fn resolve(
        &self,
        tool_name: &str,
        caller_site: DispatchSite,
    ) -> Result<DispatchSite, RouteDenial> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| RouteDenial::UnknownTool(tool_name.to_string()))?;
        let site = tool.dispatch_site();
        if Self::allowed_callers(site).contains(&caller_site) {
            Ok(site)
        } else {
            Err(RouteDenial::NotRoutable {
                tool: tool_name.to_string(),
                site,
                from: caller_site,
            })
        }
    }

    /// Borrow the underlying registry (e.g. to execute a worker-local tool
    /// directly once routing confirms it is reachable).
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flo_tool::builtin::RunJs;
    use std::sync::Arc;

    #[test]
    fn worker_local_tool_is_reachable_from_itself() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(RunJs));
        let router = CapabilityRouter::new(reg);
        assert_eq!(
            router.resolve("runjs", DispatchSite::WorkerLocal).unwrap(),
            DispatchSite::WorkerLocal
        );
    }

    #[test]
    fn worker_local_tool_is_not_reachable_from_supervisor() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(RunJs));
        let router = CapabilityRouter::new(reg);
        let err = router.resolve("runjs", DispatchSite::Supervisor).unwrap_err();
        assert!(matches!(err, RouteDenial::NotRoutable { .. }));
    }

    #[test]
    fn unknown_tool_is_reported_distinctly() {
        let router = CapabilityRouter::new(ToolRegistry::new());
        let err = router.resolve("nope", DispatchSite::WorkerLocal).unwrap_err();
        assert_eq!(err, RouteDenial::UnknownTool("nope".into()));
    }

    #[test]
    fn denial_display_names_tool_site_and_origin() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(RunJs));
        let router = CapabilityRouter::new(reg);
        let err = router.resolve("runjs", DispatchSite::Supervisor).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("runjs"));
        assert!(msg.contains("supervisor"));
    }
}
