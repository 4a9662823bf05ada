//! Static, per-agent configuration for the loop.
//!
//! Layered under [`flo_core::operator::OperatorConfig`]: this struct holds
//! the defaults an agent is configured with; `OperatorConfig` holds the
//! per-invocation overrides a caller may layer on top for one `execute` call.

use rust_decimal::Decimal;

/// Static configuration for one [`crate::operator::ReactOperator`].
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Default model id, used when no per-invocation override is given.
    pub model: String,
    /// Base system prompt.
    pub system_prompt: Option<String>,
    /// Default turn cap.
    pub default_max_turns: u32,
    /// Default USD cost cap, if any.
    pub default_max_cost: Option<Decimal>,
    /// Output-token cap requested per model turn.
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Fallback context-window size used when the provider's model registry
    /// doesn't know the configured model id.
    pub fallback_context_window: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            system_prompt: None,
            default_max_turns: 20,
            default_max_cost: None,
            max_output_tokens: None,
            temperature: None,
            fallback_context_window: 100_000,
        }
    }
}

/// Per-invocation configuration after merging [`LoopConfig`] defaults with an
/// [`flo_core::operator::OperatorConfig`] override, resolved once at the
/// start of `execute`.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Model id.
    pub model: String,
    /// Fully assembled system prompt (base + addendum, if any).
    pub system: Option<String>,
    /// Turn cap for this invocation.
    pub max_turns: u32,
    /// Cost cap for this invocation, if any.
    pub max_cost: Option<Decimal>,
    /// Output-token cap.
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Restrict tool availability to this set, if set.
    pub allowed_tools: Option<Vec<String>>,
}

impl ResolvedConfig {
    /// Merge a static [`LoopConfig`] with an optional per-invocation override.
    pub fn resolve(base: &LoopConfig, override_config: Option<&flo_core::OperatorConfig>) -> Self {
        let system = match override_config.and_then(|c| c.system_addendum.as_ref()) {
            Some(addendum) => Some(match &base.system_prompt {
                Some(base_prompt) => format!("{base_prompt}\n\n{addendum}"),
                None => addendum.clone(),
            }),
            None => base.system_prompt.clone(),
        };

        Self {
            model: override_config
                .and_then(|c| c.model.clone())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| base.model.clone()),
            system,
            max_turns: override_config
                .and_then(|c| c.max_turns)
                .unwrap_or(base.default_max_turns),
            max_cost: override_config
                .and_then(|c| c.max_cost)
                .or(base.default_max_cost),
            max_output_tokens: base.max_output_tokens,
            temperature: base.temperature,
            allowed_tools: override_config.and_then(|c| c.allowed_tools.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flo_core::OperatorConfig;

    #[test]
    fn resolve_with_no_override_uses_base_defaults() {
        let base = LoopConfig {
            model: "claude-haiku-4-5-20251001".into(),
            default_max_turns: 5,
            ..Default::default()
        };
        let resolved = ResolvedConfig::resolve(&base, None);
        assert_eq!(resolved.model, "claude-haiku-4-5-20251001");
        assert_eq!(resolved.max_turns, 5);
        assert!(resolved.max_cost.is_none());
    }

    #[test]
    fn resolve_override_model_and_turns_take_precedence() {
        let base = LoopConfig {
            model: "base-model".into(),
            default_max_turns: 5,
            ..Default::default()
        };
        let mut over = OperatorConfig::default();
        over.model = Some("override-model".into());
        over.max_turns = Some(1);
        let resolved = ResolvedConfig::resolve(&base, Some(&over));
        assert_eq!(resolved.model, "override-model");
        assert_eq!(resolved.max_turns, 1);
    }

    #[test]
    fn system_addendum_is_appended_to_base_prompt() {
        let base = LoopConfig {
            system_prompt: Some("Be terse.".into()),
            ..Default::default()
        };
        let mut over = OperatorConfig::default();
        over.system_addendum = Some("Always answer in French.".into());
        let resolved = ResolvedConfig::resolve(&base, Some(&over));
        let system = resolved.system.unwrap();
        assert!(system.contains("Be terse."));
        assert!(system.contains("Always answer in French."));
    }

    #[test]
    fn empty_model_override_falls_back_to_base() {
        let base = LoopConfig {
            model: "base-model".into(),
            ..Default::default()
        };
        let mut over = OperatorConfig::default();
        over.model = Some(String::new());
        let resolved = ResolvedConfig::resolve(&base, Some(&over));
        assert_eq!(resolved.model, "base-model");
    }
}
