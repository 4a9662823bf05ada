#![deny(missing_docs)]
//! Hook registry, rule-matcher, and security hooks for flo.
//!
//! The [`HookRegistry`] collects multiple [`Hook`] implementations into an
//! ordered pipeline. At each hook point, hooks are dispatched in
//! registration order. The pipeline short-circuits on `Deny` or `Script` —
//! subsequent hooks are not called. `Allow` and `Log` continue the
//! pipeline. Hook errors are logged and treated as `Allow` (they never
//! halt the loop; only an explicit `Deny` does that).

pub mod rule;
pub mod security;

pub use rule::{effective_rules, HookRule, SkillHookRule};
pub use security::{ExfilGuardHook, RedactionHook};

use flo_core::hook::{Hook, HookAction, HookContext};
use std::sync::Arc;

/// A registry that dispatches hook events to an ordered pipeline of hooks.
pub struct HookRegistry {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookRegistry {
    /// Create a new empty hook registry.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook to the end of the pipeline.
    pub fn add(&mut self, hook: Arc<dyn Hook>) {
        self.hooks.push(hook);
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// `true` if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Dispatch a hook event through the pipeline.
    ///
    /// Hooks not registered for `ctx.point` are skipped. If every invoked
    /// hook returns `Allow`, the result is `Allow`. If one returns `Log`
    /// and no later hook overrides it with `Deny`/`Script`, the result is
    /// `Log`. The first `Deny` or `Script` short-circuits the pipeline and
    /// is returned immediately. A hook error is logged and treated as if
    /// that hook had returned `Allow`.
    pub async fn dispatch(&self, ctx: &HookContext) -> HookAction {
        let mut logged = false;
        for hook in &self.hooks {
            if !hook.points().contains(&ctx.point) {
                continue;
            }
            match hook.on_event(ctx).await {
                Ok(HookAction::Allow) => continue,
                Ok(HookAction::Log) => {
                    logged = true;
                    continue;
                }
                Ok(action) => return action,
                Err(_e) => {
                    // A hook's own failure isn't a veto; log and move on.
                    continue;
                }
            }
        }

        if logged {
            HookAction::Log
        } else {
            HookAction::Allow
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
