//! A declarative rule-matcher hook: regex over tool name, optional input
//! predicate, bound to an action.

use async_trait::async_trait;
use flo_core::hook::{Hook, HookAction, HookContext, HookError, HookPoint};
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

/// One rule: match a hook point, a tool-name pattern, and an optional
/// predicate over the tool input, then fire a fixed action.
///
/// A rule with no `input_predicate` matches on point + tool name alone.
#[derive(Clone)]
pub struct HookRule {
    /// The point this rule is evaluated at.
    pub point: HookPoint,
    /// Matched against `ctx.tool_name` (or the empty string if absent).
    pub tool_pattern: Regex,
    /// Extra condition over `ctx.tool_input`, evaluated only if the tool
    /// name already matched. `None` means "always true".
    pub input_predicate: Option<Arc<dyn Fn(&Value) -> bool + Send + Sync>>,
    /// The action to take when this rule matches.
    pub action: HookAction,
}

impl std::fmt::Debug for HookRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRule")
            .field("point", &self.point)
            .field("tool_pattern", &self.tool_pattern.as_str())
            .field("has_input_predicate", &self.input_predicate.is_some())
            .field("action", &self.action)
            .finish()
    }
}

impl HookRule {
    /// Build a rule that matches on tool name alone.
    pub fn new(point: HookPoint, tool_pattern: Regex, action: HookAction) -> Self {
        Self {
            point,
            tool_pattern,
            input_predicate: None,
            action,
        }
    }

    /// Attach an extra predicate over the tool input.
    pub fn with_input_predicate(
        mut self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.input_predicate = Some(Arc::new(predicate));
        self
    }

    fn matches(&self, ctx: &HookContext) -> bool {
        if ctx.point != self.point {
            return false;
        }
        let name = ctx.tool_name.as_deref().unwrap_or("");
        if !self.tool_pattern.is_match(name) {
            return false;
        }
        match &self.input_predicate {
            None => true,
            Some(pred) => match &ctx.tool_input {
                Some(input) => pred(input),
                None => false,
            },
        }
    }
}

/// A rule contributed by a skill, rather than bound directly to an agent.
///
/// Carries the owning skill's name so [`effective_rules`] can filter by
/// which skills are currently active.
#[derive(Clone, Debug)]
pub struct SkillHookRule {
    /// The skill this rule belongs to.
    pub skill: String,
    /// The rule itself.
    pub rule: HookRule,
}

/// Merge an agent's own rules with the rules contributed by its currently
/// active skills.
///
/// A pure function: it clones rather than mutates either input, so the
/// base rule sets (agent config, skill definitions) are never altered by
/// evaluating this merge. Skill rules whose skill isn't in `active_skills`
/// are dropped; order is preserved (agent rules first, then skill rules in
/// the order their skills were declared active).
pub fn effective_rules(
    agent_rules: &[HookRule],
    skill_rules: &[SkillHookRule],
    active_skills: &[String],
) -> Vec<HookRule> {
    let mut merged: Vec<HookRule> = agent_rules.to_vec();
    merged.extend(
        skill_rules
            .iter()
            .filter(|sr| active_skills.iter().any(|s| s == &sr.skill))
            .map(|sr| sr.rule.clone()),
    );
    merged
}

/// A [`Hook`] that evaluates an ordered list of [`HookRule`]s and fires the
/// first one that matches.
pub struct RuleHook {
    rules: Vec<HookRule>,
    points: Vec<HookPoint>,
}

impl RuleHook {
    /// Build a rule hook from a rule set. The hook's `points()` is the
    /// deduplicated set of points referenced by any rule.
    pub fn new(rules: Vec<HookRule>) -> Self {
        let mut points = Vec::new();
        for rule in &rules {
            if !points.contains(&rule.point) {
                points.push(rule.point);
            }
        }
        Self { rules, points }
    }
}

#[async_trait]
impl Hook for RuleHook {
    fn points(&self) -> &[HookPoint] {
        &self.points
    }

    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError> {
        for rule in &self.rules {
            if rule.matches(ctx) {
                return Ok(rule.action.clone());
            }
        }
        Ok(HookAction::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx_with(tool: &str, input: Value) -> HookContext {
        let mut ctx = HookContext::new(HookPoint::PreToolUse);
        ctx.tool_name = Some(tool.to_string());
        ctx.tool_input = Some(input);
        ctx
    }

    #[tokio::test]
    async fn matching_rule_fires_its_action() {
        let rule = HookRule::new(
            HookPoint::PreToolUse,
            Regex::new("^shell$").unwrap(),
            HookAction::Deny {
                reason: "shell is disabled".into(),
            },
        );
        let hook = RuleHook::new(vec![rule]);
        let action = hook.on_event(&ctx_with("shell", json!({}))).await.unwrap();
        assert!(matches!(action, HookAction::Deny { .. }));
    }

    #[tokio::test]
    async fn non_matching_tool_name_allows() {
        let rule = HookRule::new(
            HookPoint::PreToolUse,
            Regex::new("^shell$").unwrap(),
            HookAction::Deny {
                reason: "shell is disabled".into(),
            },
        );
        let hook = RuleHook::new(vec![rule]);
        let action = hook.on_event(&ctx_with("read_file", json!({}))).await.unwrap();
        assert!(matches!(action, HookAction::Allow));
    }

    #[tokio::test]
    async fn input_predicate_narrows_the_match() {
        let rule = HookRule::new(
            HookPoint::PreToolUse,
            Regex::new("^shell$").unwrap(),
            HookAction::Deny {
                reason: "rm -rf is disabled".into(),
            },
        )
        .with_input_predicate(|input| {
            input
                .get("cmd")
                .and_then(Value::as_str)
                .is_some_and(|s| s.contains("rm -rf"))
        });
        let hook = RuleHook::new(vec![rule]);

        let benign = hook
            .on_event(&ctx_with("shell", json!({"cmd": "ls"})))
            .await
            .unwrap();
        assert!(matches!(benign, HookAction::Allow));

        let dangerous = hook
            .on_event(&ctx_with("shell", json!({"cmd": "rm -rf /"})))
            .await
            .unwrap();
        assert!(matches!(dangerous, HookAction::Deny { .. }));
    }

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let rules = vec![
            HookRule::new(HookPoint::PreToolUse, Regex::new(".*").unwrap(), HookAction::Log),
            HookRule::new(
                HookPoint::PreToolUse,
                Regex::new("^shell$").unwrap(),
                HookAction::Deny {
                    reason: "unreachable".into(),
                },
            ),
        ];
        let hook = RuleHook::new(rules);
        let action = hook.on_event(&ctx_with("shell", json!({}))).await.unwrap();
        assert!(matches!(action, HookAction::Log));
    }

    #[test]
    fn effective_rules_includes_only_active_skills() {
        let agent_rules = vec![HookRule::new(
            HookPoint::PreToolUse,
            Regex::new("^a$").unwrap(),
            HookAction::Allow,
        )];
        let skill_rules = vec![
            SkillHookRule {
                skill: "active-skill".into(),
                rule: HookRule::new(HookPoint::PreToolUse, Regex::new("^b$").unwrap(), HookAction::Log),
            },
            SkillHookRule {
                skill: "inactive-skill".into(),
                rule: HookRule::new(HookPoint::PreToolUse, Regex::new("^c$").unwrap(), HookAction::Log),
            },
        ];
        let active = vec!["active-skill".to_string()];

        let merged = effective_rules(&agent_rules, &skill_rules, &active);
        assert_eq!(merged.len(), 2);
        assert_eq!(agent_rules.len(), 1, "base agent rules must not be mutated");
    }

    #[test]
    fn effective_rules_with_no_active_skills_returns_only_agent_rules() {
        let agent_rules = vec![HookRule::new(
            HookPoint::PreToolUse,
            Regex::new("^a$").unwrap(),
            HookAction::Allow,
        )];
        let skill_rules = vec![SkillHookRule {
            skill: "some-skill".into(),
            rule: HookRule::new(HookPoint::PreToolUse, Regex::new("^b$").unwrap(), HookAction::Log),
        }];
        let merged = effective_rules(&agent_rules, &skill_rules, &[]);
        assert_eq!(merged.len(), 1);
    }

    fn _assert_object_safe(_: &dyn Hook) {}
}
