//! `AgentConfig`: the mutable, per-agent configuration record.
//!
//! Mirrors the data model's `AgentConfig` entry verbatim — id, provider,
//! model, tool set, budgets, network policy, sandbox permissions, optional
//! hub attachment, and an opaque `viewState` blob the surrounding UI owns.
//! Updated only through [`crate::supervisor::AgentSupervisor::update_config`],
//! which merges a partial update and fans the result out as a
//! `config_update` broadcast rather than mutating any live worker directly.

use flo_core::id::{AgentId, HubConnectionId};
use flo_core::sandbox::{HubProxyPatterns, NetworkPolicy, SandboxPermissions};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The full, mutable configuration record for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Stable unique id.
    pub id: AgentId,
    /// Human-readable name.
    pub name: String,
    /// Provider name (`"anthropic"`, `"openai"`, `"ollama"`, ...).
    pub provider: String,
    /// Model id, provider-specific.
    pub model: String,
    /// Base system prompt.
    pub system_prompt: Option<String>,
    /// Enabled tool names.
    pub tools: Vec<String>,
    /// Output-token cap requested per model turn.
    pub max_tokens: Option<u32>,
    /// Cumulative token budget for this agent's lifetime, if any.
    pub token_budget: Option<u64>,
    /// Cumulative USD cost budget for this agent's lifetime, if any.
    pub cost_budget_usd: Option<Decimal>,
    /// Egress policy.
    pub network_policy: NetworkPolicy,
    /// Hub-proxy routing patterns.
    pub hub_proxy_patterns: HubProxyPatterns,
    /// Granted sandbox capability flags.
    pub sandbox_permissions: SandboxPermissions,
    /// The hub connection this agent is attached to, if any.
    pub hub_connection_id: Option<HubConnectionId>,
    /// Path under the hub's filesystem this agent is scoped to, if hub-attached.
    pub hub_sandbox_path: Option<String>,
    /// Opaque, UI-owned view state blob.
    pub view_state: Value,
}

impl AgentConfig {
    /// Build a new config with otherwise-default fields.
    pub fn new(id: impl Into<AgentId>, provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            provider: provider.into(),
            model: model.into(),
            system_prompt: None,
            tools: Vec::new(),
            max_tokens: None,
            token_budget: None,
            cost_budget_usd: None,
            network_policy: NetworkPolicy::default(),
            hub_proxy_patterns: HubProxyPatterns::default(),
            sandbox_permissions: SandboxPermissions::default(),
            hub_connection_id: None,
            hub_sandbox_path: None,
            view_state: Value::Null,
        }
    }
}

/// A partial update applied to an [`AgentConfig`] by `updateConfig`.
///
/// Every field is optional; `None` leaves the corresponding `AgentConfig`
/// field untouched. There is no way to express "clear this field" other
/// than for the `Option`-typed fields themselves (setting them to
/// `Some(None)` would be the usual trick, but this update is a merge, not
/// a replace, so clearing a budget means sending a fresh full config
/// through agent re-creation instead).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    /// New name, if changing.
    pub name: Option<String>,
    /// New model, if changing.
    pub model: Option<String>,
    /// New system prompt, if changing.
    pub system_prompt: Option<String>,
    /// New enabled tool set, if changing.
    pub tools: Option<Vec<String>>,
    /// New output-token cap, if changing.
    pub max_tokens: Option<u32>,
    /// New token budget, if changing.
    pub token_budget: Option<u64>,
    /// New cost budget, if changing.
    pub cost_budget_usd: Option<Decimal>,
    /// New network policy, if changing. Takes effect on next sandbox recreation.
    pub network_policy: Option<NetworkPolicy>,
    /// New hub-proxy patterns, if changing.
    pub hub_proxy_patterns: Option<HubProxyPatterns>,
    /// New sandbox permissions, if changing. Takes effect on next sandbox recreation.
    pub sandbox_permissions: Option<SandboxPermissions>,
    /// New view state, if changing.
    pub view_state: Option<Value>,
}

impl AgentConfig {
    /// Merge a partial update into this config in place.
    pub fn apply_update(&mut self, update: ConfigUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if update.system_prompt.is_some() {
            self.system_prompt = update.system_prompt;
        }
        if let Some(tools) = update.tools {
            self.tools = tools;
        }
        if update.max_tokens.is_some() {
            self.max_tokens = update.max_tokens;
        }
        if update.token_budget.is_some() {
            self.token_budget = update.token_budget;
        }
        if update.cost_budget_usd.is_some() {
            self.cost_budget_usd = update.cost_budget_usd;
        }
        if let Some(policy) = update.network_policy {
            self.network_policy = policy;
        }
        if let Some(patterns) = update.hub_proxy_patterns {
            self.hub_proxy_patterns = patterns;
        }
        if let Some(permissions) = update.sandbox_permissions {
            self.sandbox_permissions = permissions;
        }
        if let Some(view_state) = update.view_state {
            self.view_state = view_state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_has_empty_tool_set_and_allow_all_network() {
        let config = AgentConfig::new("a1", "anthropic", "claude-haiku-4-5-20251001");
        assert!(config.tools.is_empty());
        assert_eq!(config.network_policy, NetworkPolicy::AllowAll);
        assert!(config.hub_connection_id.is_none());
    }

    #[test]
    fn apply_update_only_touches_set_fields() {
        let mut config = AgentConfig::new("a1", "anthropic", "claude-haiku-4-5-20251001");
        config.name = "Original".into();
        config.max_tokens = Some(1024);

        let update = ConfigUpdate {
            model: Some("claude-opus-4-5-20251101".into()),
            ..Default::default()
        };
        config.apply_update(update);

        assert_eq!(config.name, "Original");
        assert_eq!(config.model, "claude-opus-4-5-20251101");
        assert_eq!(config.max_tokens, Some(1024));
    }

    #[test]
    fn apply_update_replaces_tool_set_wholesale() {
        let mut config = AgentConfig::new("a1", "anthropic", "m");
        config.tools = vec!["runjs".into()];
        config.apply_update(ConfigUpdate {
            tools: Some(vec!["runjs".into(), "bash".into()]),
            ..Default::default()
        });
        assert_eq!(config.tools, vec!["runjs".to_string(), "bash".to_string()]);
    }
}
