//! The hub wire protocol: one JSON frame per message.
//!
//! Split into [`IncomingFrame`] (consumed from the hub) and [`OutgoingFrame`]
//! (emitted by this side) rather than one symmetric enum, since core code
//! never needs to match against a frame it only ever sends, or construct one
//! it only ever receives. Both serialize under a `type` tag, `id` on
//! correlated frames and `agent_id` on per-agent ones, per the wire protocol.

use flo_core::event::AgentEvent;
use flo_core::id::AgentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in a hub's `announce_tools` capability list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubToolSpec {
    /// Tool name, matched against local tool registrations.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema describing valid input.
    pub input_schema: Value,
}

/// Frames this side consumes from the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum IncomingFrame {
    /// Response to an `auth` challenge.
    AuthResult {
        /// Correlates to the `auth` frame's id.
        id: String,
        /// `true` if the token was accepted.
        success: bool,
        /// A human-readable reason, present when `success` is `false`.
        message: Option<String>,
    },
    /// The hub's current tool capability set, announced on connect and
    /// whenever it changes.
    AnnounceTools {
        /// The tools the hub can now execute.
        tools: Vec<HubToolSpec>,
    },
    /// Response to a `tool_call` frame.
    ToolCallResult {
        /// Correlates to the `tool_call` frame's id.
        id: String,
        /// Rendered result content.
        result: Value,
        /// Whether the tool execution failed.
        is_error: bool,
    },
    /// Response to a `fetch_request` frame.
    FetchResult {
        /// Correlates to the `fetch_request` frame's id.
        id: String,
        /// Upstream HTTP status.
        status: u16,
        /// Response body, passed through unchanged.
        body: String,
    },
    /// Response to a `persist_agent` frame.
    PersistResult {
        /// Correlates to the `persist_agent` frame's id.
        id: String,
        /// `true` if the persist succeeded.
        success: bool,
    },
    /// A remote agent emitted an event the hub is relaying.
    AgentEvent {
        /// Which agent this event belongs to.
        agent_id: AgentId,
        /// The event itself.
        event: AgentEvent,
    },
    /// A remote agent's state snapshot, pushed by the hub.
    AgentState {
        /// Which agent this applies to.
        agent_id: AgentId,
        /// The opaque state blob.
        state: Value,
    },
    /// The hub's VAPID public key, for push-subscription setup.
    VapidPublicKey {
        /// Base64url-encoded public key.
        key: String,
    },
    /// The hub's routable context changed (capability set, connectivity, or policy).
    ContextChange {
        /// Which agent this applies to, if scoped; `None` for a global change.
        agent_id: Option<AgentId>,
        /// Human-readable reason.
        reason: String,
    },
}

/// Frames this side emits to the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum OutgoingFrame {
    /// Opens the challenge-response auth handshake.
    Auth {
        /// Id the matching `auth_result` will carry.
        id: String,
        /// The per-client auth token.
        token: String,
    },
    /// Subscribe to `agent_event`/`agent_state` frames for one agent.
    SubscribeAgent {
        /// The agent to subscribe to.
        agent_id: AgentId,
    },
    /// Stop receiving frames for one agent.
    UnsubscribeAgent {
        /// The agent to unsubscribe from.
        agent_id: AgentId,
    },
    /// Delegate a tool call to the hub.
    ToolCall {
        /// Correlation id for the matching `tool_call_result`.
        id: String,
        /// The agent on whose behalf this call is made.
        agent_id: AgentId,
        /// Tool name.
        name: String,
        /// Tool input.
        input: Value,
    },
    /// Ask the hub to perform an HTTP fetch on this side's behalf.
    FetchRequest {
        /// Correlation id for the matching `fetch_result`.
        id: String,
        /// Target URL.
        url: String,
        /// HTTP method.
        method: String,
        /// Request headers.
        headers: Vec<(String, String)>,
        /// Request body, if any.
        body: Option<String>,
    },
    /// Ask the hub to persist an agent snapshot.
    PersistAgent {
        /// Correlation id for the matching `persist_result`.
        id: String,
        /// The agent being persisted.
        agent_id: AgentId,
        /// The snapshot payload.
        snapshot: Value,
    },
    /// Report a local agent action to the hub.
    AgentAction {
        /// Which agent performed the action.
        agent_id: AgentId,
        /// The action payload.
        action: Value,
    },
    /// Deliver a message to a remote agent via the hub.
    SendMessageToAgent {
        /// The target agent.
        agent_id: AgentId,
        /// The message payload.
        message: Value,
    },
    /// Ask the hub to restore a previously persisted agent.
    RestoreAgent {
        /// The agent to restore.
        agent_id: AgentId,
    },
    /// Register a push subscription for one agent.
    PushSubscribe {
        /// The agent this subscription is for.
        agent_id: AgentId,
        /// The browser push-subscription payload.
        subscription: Value,
    },
    /// Report a local visibility change for one agent.
    VisibilityState {
        /// The agent whose visibility changed.
        agent_id: AgentId,
        /// `true` if now visible.
        visible: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incoming_frame_tag_is_snake_case_type() {
        let frame = IncomingFrame::ToolCallResult {
            id: "t-1".into(),
            result: Value::Null,
            is_error: false,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "tool_call_result");
        assert_eq!(json["id"], "t-1");
    }

    #[test]
    fn outgoing_frame_tag_is_snake_case_type() {
        let frame = OutgoingFrame::SubscribeAgent {
            agent_id: AgentId::new("a1"),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "subscribe_agent");
        assert_eq!(json["agent_id"], "a1");
    }

    #[test]
    fn context_change_agent_id_is_optional() {
        let frame = IncomingFrame::ContextChange {
            agent_id: None,
            reason: "disconnected".into(),
        };
        let json = serde_json::to_string(&frame).unwrap();
        let back: IncomingFrame = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, IncomingFrame::ContextChange { agent_id: None, .. }));
    }
}
