//! The five built-in "effect tools" every agent can call regardless of its
//! configured tool set: `write_memory`, `delete_memory`, `delegate`,
//! `handoff`, `signal`. Calling one of these never reaches a
//! [`crate::tool_exec::ToolExecutor`] — the loop recognizes the name,
//! translates the call straight into an [`Effect`] for the caller to carry
//! out, and answers the model with a synthetic tool result.

use flo_core::content::Message;
use flo_core::effect::{Effect, Scope, SignalPayload};
use flo_core::id::{AgentId, WorkflowId};
use flo_core::operator::{OperatorInput, TriggerType};
use flo_provider::ToolSpec;
use serde_json::Value;

/// Names recognized as effect tools rather than routed to a
/// [`crate::tool_exec::ToolExecutor`].
pub const EFFECT_TOOL_NAMES: &[&str] =
    &["write_memory", "delete_memory", "delegate", "handoff", "signal"];

/// `true` if `name` is one of [`EFFECT_TOOL_NAMES`].
pub fn is_effect_tool(name: &str) -> bool {
    EFFECT_TOOL_NAMES.contains(&name)
}

/// Schemas for the five effect tools, always advertised to the model
/// alongside whatever a [`crate::tool_exec::ToolExecutor`] contributes.
pub fn effect_tool_schemas() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "write_memory",
            "Write a value into scoped state.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "scope": {"type": "string", "description": "\"global\", \"workflow:<id>\", or a custom scope name"},
                    "key": {"type": "string"},
                    "value": {}
                },
                "required": ["scope", "key", "value"]
            }),
        ),
        ToolSpec::new(
            "delete_memory",
            "Delete a key from scoped state.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "scope": {"type": "string"},
                    "key": {"type": "string"}
                },
                "required": ["scope", "key"]
            }),
        ),
        ToolSpec::new(
            "delegate",
            "Spawn a subagent to carry out a task and report back.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "agent": {"type": "string"},
                    "message": {"type": "string"}
                },
                "required": ["agent", "message"]
            }),
        ),
        ToolSpec::new(
            "handoff",
            "Hand conversation state off to another agent without starting it immediately.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "agent": {"type": "string"},
                    "state": {}
                },
                "required": ["agent", "state"]
            }),
        ),
        ToolSpec::new(
            "signal",
            "Notify another workflow of an event.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "target": {"type": "string"},
                    "signal_type": {"type": "string"},
                    "data": {}
                },
                "required": ["target", "signal_type"]
            }),
        ),
    ]
}

/// Parse a scope string as written by the model into a [`Scope`].
///
/// `"global"` maps to [`Scope::Global`]; `"workflow:<id>"` maps to
/// [`Scope::Workflow`]; anything else is carried through as
/// [`Scope::Custom`]. Unlike the scope grammar this is adapted from,
/// `flo_core::effect::Scope` has no bare `Session` variant — a model asking
/// for `"session:..."` scoping still lands in `Custom` rather than being
/// rejected.
pub fn parse_scope(s: &str) -> Scope {
    if s == "global" {
        Scope::Global
    } else if let Some(id) = s.strip_prefix("workflow:") {
        Scope::Workflow(WorkflowId::new(id))
    } else {
        Scope::Custom(s.to_string())
    }
}

/// Translate one effect tool's already-parsed JSON input into an [`Effect`].
///
/// Returns `Err` with a model-facing message (surfaced as a synthetic error
/// tool result) if the input is missing a required field.
pub fn build_effect(name: &str, input: &Value) -> Result<Effect, String> {
    match name {
        "write_memory" => {
            let scope = input
                .get("scope")
                .and_then(Value::as_str)
                .ok_or("write_memory requires a \"scope\" string")?;
            let key = input
                .get("key")
                .and_then(Value::as_str)
                .ok_or("write_memory requires a \"key\" string")?;
            let value = input
                .get("value")
                .cloned()
                .ok_or("write_memory requires a \"value\"")?;
            Ok(Effect::WriteMemory {
                scope: parse_scope(scope),
                key: key.to_string(),
                value,
            })
        }
        "delete_memory" => {
            let scope = input
                .get("scope")
                .and_then(Value::as_str)
                .ok_or("delete_memory requires a \"scope\" string")?;
            let key = input
                .get("key")
                .and_then(Value::as_str)
                .ok_or("delete_memory requires a \"key\" string")?;
            Ok(Effect::DeleteMemory {
                scope: parse_scope(scope),
                key: key.to_string(),
            })
        }
        "delegate" => {
            let agent = input
                .get("agent")
                .and_then(Value::as_str)
                .ok_or("delegate requires an \"agent\" string")?;
            let message = input
                .get("message")
                .and_then(Value::as_str)
                .ok_or("delegate requires a \"message\" string")?;
            Ok(Effect::Delegate {
                agent: AgentId::new(agent),
                input: Box::new(OperatorInput::new(Message::user(message), TriggerType::Task)),
            })
        }
        "handoff" => {
            let agent = input
                .get("agent")
                .and_then(Value::as_str)
                .ok_or("handoff requires an \"agent\" string")?;
            let state = input
                .get("state")
                .cloned()
                .ok_or("handoff requires a \"state\"")?;
            Ok(Effect::Handoff {
                agent: AgentId::new(agent),
                state,
            })
        }
        "signal" => {
            let target = input
                .get("target")
                .and_then(Value::as_str)
                .ok_or("signal requires a \"target\" string")?;
            let signal_type = input
                .get("signal_type")
                .and_then(Value::as_str)
                .ok_or("signal requires a \"signal_type\" string")?;
            let data = input.get("data").cloned().unwrap_or(Value::Null);
            Ok(Effect::Signal {
                target: WorkflowId::new(target),
                payload: SignalPayload::new(signal_type, data),
            })
        }
        other => Err(format!("{other} is not an effect tool")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_tool_schemas_cover_every_name() {
        let schemas = effect_tool_schemas();
        let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        for name in EFFECT_TOOL_NAMES {
            assert!(names.contains(name), "missing schema for {name}");
        }
    }

    #[test]
    fn parse_scope_recognizes_global_and_workflow() {
        assert_eq!(parse_scope("global"), Scope::Global);
        match parse_scope("workflow:w-1") {
            Scope::Workflow(id) => assert_eq!(id.as_str(), "w-1"),
            _ => panic!("expected Workflow scope"),
        }
        match parse_scope("whatever") {
            Scope::Custom(s) => assert_eq!(s, "whatever"),
            _ => panic!("expected Custom scope"),
        }
    }

    #[test]
    fn build_effect_write_memory() {
        let input = serde_json::json!({"scope": "global", "key": "k", "value": 1});
        let effect = build_effect("write_memory", &input).unwrap();
        match effect {
            Effect::WriteMemory { scope, key, value } => {
                assert_eq!(scope, Scope::Global);
                assert_eq!(key, "k");
                assert_eq!(value, 1);
            }
            _ => panic!("expected WriteMemory"),
        }
    }

    #[test]
    fn build_effect_delegate_sets_task_trigger() {
        let input = serde_json::json!({"agent": "researcher", "message": "do this task"});
        let effect = build_effect("delegate", &input).unwrap();
        match effect {
            Effect::Delegate { agent, input } => {
                assert_eq!(agent.as_str(), "researcher");
                assert_eq!(input.message.text(), "do this task");
                assert_eq!(input.trigger, TriggerType::Task);
            }
            _ => panic!("expected Delegate"),
        }
    }

    #[test]
    fn build_effect_signal_defaults_missing_data_to_null() {
        let input = serde_json::json!({"target": "w-1", "signal_type": "classify"});
        let effect = build_effect("signal", &input).unwrap();
        match effect {
            Effect::Signal { target, payload } => {
                assert_eq!(target.as_str(), "w-1");
                assert_eq!(payload.signal_type, "classify");
                assert_eq!(payload.data, Value::Null);
            }
            _ => panic!("expected Signal"),
        }
    }

    #[test]
    fn build_effect_missing_field_returns_model_facing_error() {
        let err = build_effect("write_memory", &serde_json::json!({"scope": "global"}))
            .unwrap_err();
        assert!(err.contains("key"));
    }

    #[test]
    fn build_effect_rejects_non_effect_tool() {
        assert!(build_effect("search", &Value::Null).is_err());
    }
}
