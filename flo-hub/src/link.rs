//! The in-process half of the Hub protocol.
//!
//! `HubLink` owns nothing about how bytes reach the hub — that is
//! [`HubTransport`]'s job — it only owns the protocol state that survives a
//! transport swap: the auth handshake, the correlation table for
//! `tool_call`/`fetch_request`/`persist_agent` round-trips, the last
//! `announce_tools` capability set, and which agents are currently
//! subscribed for `agent_event`/`agent_state` relay.

use crate::error::HubError;
use crate::frame::{HubToolSpec, IncomingFrame, OutgoingFrame};
use async_trait::async_trait;
use flo_core::event::AgentEvent;
use flo_core::id::AgentId;
use flo_relay::correlation::{await_correlated, default_timeout, CorrelationFailure, CorrelationTable};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use tokio::sync::mpsc;

/// Sends a frame to the hub over whatever transport is actually wired up.
///
/// Implementations: a `tokio-tungstenite` WebSocket writer, or — for tests —
/// a channel that records every frame sent.
#[async_trait]
pub trait HubTransport: Send + Sync {
    /// Send one outgoing frame.
    async fn send(&self, frame: OutgoingFrame) -> Result<(), HubError>;
}

/// Result of a successful `tool_call` delegated to the hub.
#[derive(Debug, Clone)]
pub struct HubToolResult {
    /// Rendered result content.
    pub result: Value,
    /// Whether the hub reported the tool as having failed.
    pub is_error: bool,
}

/// Result of a `fetch_request` proxied through the hub.
#[derive(Debug, Clone)]
pub struct HubFetchResult {
    /// Upstream HTTP status.
    pub status: u16,
    /// Response body, passed through unchanged.
    pub body: String,
}

enum Correlated {
    ToolCall(Result<HubToolResult, HubError>),
    Fetch(Result<HubFetchResult, HubError>),
    Persist(Result<bool, HubError>),
    Auth(Result<(), HubError>),
}

fn next_id(prefix: &str, counter: &AtomicU64) -> String {
    let n = counter.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{n}")
}

/// The in-process Hub Link: protocol state plus a pluggable [`HubTransport`].
///
/// Frames relayed for subscribed agents (`agent_event`, `agent_state`) are
/// pushed onto an unbounded channel the caller drains via
/// [`HubLink::events`] — an in-process analogue of the browser side
/// dispatching events to listeners, since this crate has no event-loop of
/// its own to dispatch through.
pub struct HubLink {
    transport: Box<dyn HubTransport>,
    connected: AtomicBool,
    correlations: CorrelationTable<Correlated>,
    next_id: AtomicU64,
    tools: RwLock<HashMap<String, HubToolSpec>>,
    subscriptions: RwLock<HashSet<AgentId>>,
    events: mpsc::UnboundedSender<HubRelayedEvent>,
    event_rx: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<HubRelayedEvent>>>,
}

/// An event relayed from a remote, hub-hosted agent to a local subscriber.
#[derive(Clone)]
#[non_exhaustive]
pub enum HubRelayedEvent {
    /// A remote agent emitted an [`AgentEvent`].
    Agent {
        /// Which agent.
        agent: AgentId,
        /// The event itself.
        event: AgentEvent,
    },
    /// A remote agent's opaque state snapshot changed.
    State {
        /// Which agent.
        agent: AgentId,
        /// The new state blob.
        state: Value,
    },
    /// The hub's routable context changed (disconnection, capability set, policy).
    ContextChange {
        /// Scoped to one agent, or `None` for a global change.
        agent: Option<AgentId>,
        /// Human-readable reason.
        reason: String,
    },
}

impl HubLink {
    /// Build a new link over the given transport. Starts disconnected, with
    /// an empty capability set and no subscriptions.
    pub fn new(transport: impl HubTransport + 'static) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            transport: Box::new(transport),
            connected: AtomicBool::new(false),
            correlations: CorrelationTable::new(),
            next_id: AtomicU64::new(1),
            tools: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashSet::new()),
            events: tx,
            event_rx: tokio::sync::Mutex::new(Some(rx)),
        }
    }

    /// Take the receiving half of the relayed-event channel. Callable once;
    /// a second call returns `None`.
    pub async fn events(&self) -> Option<mpsc::UnboundedReceiver<HubRelayedEvent>> {
        self.event_rx.lock().await.take()
    }

    /// Whether the auth handshake has completed successfully.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// The hub's last-announced capability set.
    pub fn capabilities(&self) -> Vec<HubToolSpec> {
        self.tools.read().expect("lock poisoned").values().cloned().collect()
    }

    /// Whether `tool_name` is in the hub's last-announced capability set —
    /// the query the supervisor's tool registry makes to learn which tools
    /// route to the hub.
    pub fn is_tool_routable(&self, tool_name: &str) -> bool {
        self.connected.load(Ordering::SeqCst) && self.tools.read().expect("lock poisoned").contains_key(tool_name)
    }

    /// Open the challenge-response auth handshake and await the result.
    pub async fn auth(&self, token: impl Into<String>) -> Result<(), HubError> {
        let id = next_id("auth", &self.next_id);
        let rx = self.correlations.register(id.clone());
        self.transport
            .send(OutgoingFrame::Auth { id, token: token.into() })
            .await?;
        match await_correlated(rx, default_timeout::TOOL_CALL).await {
            Ok(Correlated::Auth(result)) => {
                if result.is_ok() {
                    self.connected.store(true, Ordering::SeqCst);
                }
                result
            }
            Ok(_) => Err(HubError::Protocol("auth response carried the wrong correlation kind".into())),
            Err(CorrelationFailure::Timeout) => Err(HubError::Timeout),
            Err(CorrelationFailure::Cancelled) => Err(HubError::Cancelled),
        }
    }

    /// Subscribe to `agent_event`/`agent_state` frames for one agent.
    pub async fn subscribe_agent(&self, agent: AgentId) -> Result<(), HubError> {
        self.subscriptions.write().expect("lock poisoned").insert(agent.clone());
        self.transport.send(OutgoingFrame::SubscribeAgent { agent_id: agent }).await
    }

    /// Stop receiving frames for one agent.
    pub async fn unsubscribe_agent(&self, agent: AgentId) -> Result<(), HubError> {
        self.subscriptions.write().expect("lock poisoned").remove(&agent);
        self.transport.send(OutgoingFrame::UnsubscribeAgent { agent_id: agent }).await
    }

    /// Delegate a tool call to the hub and await its result.
    ///
    /// Rejects up front with [`HubError::ToolNotRoutable`] if the tool is
    /// not in the last-announced capability set — the relay resolves this
    /// correlation exactly as if the supervisor had executed the tool
    /// locally once `tool_call_result` arrives.
    pub async fn call_tool(&self, agent: AgentId, name: &str, input: Value) -> Result<HubToolResult, HubError> {
        if !self.is_tool_routable(name) {
            return Err(HubError::ToolNotRoutable(name.to_string()));
        }
        let id = next_id("tool", &self.next_id);
        let rx = self.correlations.register(id.clone());
        self.transport
            .send(OutgoingFrame::ToolCall {
                id,
                agent_id: agent,
                name: name.to_string(),
                input,
            })
            .await?;
        match await_correlated(rx, default_timeout::TOOL_CALL).await {
            Ok(Correlated::ToolCall(result)) => result,
            Ok(_) => Err(HubError::Protocol("tool_call response carried the wrong correlation kind".into())),
            Err(CorrelationFailure::Timeout) => Err(HubError::Timeout),
            Err(CorrelationFailure::Cancelled) => Err(HubError::Cancelled),
        }
    }

    /// Ask the hub to perform an HTTP fetch on this side's behalf
    /// (network-policy `useHubProxy` routing).
    pub async fn fetch(
        &self,
        url: &str,
        method: &str,
        headers: Vec<(String, String)>,
        body: Option<String>,
    ) -> Result<HubFetchResult, HubError> {
        let id = next_id("fetch", &self.next_id);
        let rx = self.correlations.register(id.clone());
        self.transport
            .send(OutgoingFrame::FetchRequest {
                id,
                url: url.to_string(),
                method: method.to_string(),
                headers,
                body,
            })
            .await?;
        match await_correlated(rx, default_timeout::TOOL_CALL).await {
            Ok(Correlated::Fetch(result)) => result,
            Ok(_) => Err(HubError::Protocol("fetch_request response carried the wrong correlation kind".into())),
            Err(CorrelationFailure::Timeout) => Err(HubError::Timeout),
            Err(CorrelationFailure::Cancelled) => Err(HubError::Cancelled),
        }
    }

    /// Ask the hub to persist an agent snapshot.
    pub async fn persist_agent(&self, agent: AgentId, snapshot: Value) -> Result<bool, HubError> {
        let id = next_id("persist", &self.next_id);
        let rx = self.correlations.register(id.clone());
        self.transport
            .send(OutgoingFrame::PersistAgent { id, agent_id: agent, snapshot })
            .await?;
        match await_correlated(rx, default_timeout::TOOL_CALL).await {
            Ok(Correlated::Persist(result)) => result,
            Ok(_) => Err(HubError::Protocol("persist_agent response carried the wrong correlation kind".into())),
            Err(CorrelationFailure::Timeout) => Err(HubError::Timeout),
            Err(CorrelationFailure::Cancelled) => Err(HubError::Cancelled),
        }
    }

    /// Report a local visibility change for one agent.
    pub async fn report_visibility(&self, agent: AgentId, visible: bool) -> Result<(), HubError> {
        self.transport.send(OutgoingFrame::VisibilityState { agent_id: agent, visible }).await
    }

    /// Ask the hub to restore a previously persisted agent.
    pub async fn restore_agent(&self, agent: AgentId) -> Result<(), HubError> {
        self.transport.send(OutgoingFrame::RestoreAgent { agent_id: agent }).await
    }

    /// Process one frame received from the hub, the "callback for `onFrame`"
    /// the design describes. Resolves any matching correlation, updates the
    /// capability set, or forwards a relayed event to [`HubLink::events`].
    pub fn handle_incoming(&self, frame: IncomingFrame) {
        match frame {
            IncomingFrame::AuthResult { id, success, message } => {
                let result = if success { Ok(()) } else { Err(HubError::AuthFailed(message.unwrap_or_default())) };
                self.correlations.resolve(&id, Correlated::Auth(result));
            }
            IncomingFrame::AnnounceTools { tools } => {
                let mut map = self.tools.write().expect("lock poisoned");
                map.clear();
                for tool in tools {
                    map.insert(tool.name.clone(), tool);
                }
            }
            IncomingFrame::ToolCallResult { id, result, is_error } => {
                self.correlations.resolve(&id, Correlated::ToolCall(Ok(HubToolResult { result, is_error })));
            }
            IncomingFrame::FetchResult { id, status, body } => {
                self.correlations.resolve(&id, Correlated::Fetch(Ok(HubFetchResult { status, body })));
            }
            IncomingFrame::PersistResult { id, success } => {
                self.correlations.resolve(&id, Correlated::Persist(Ok(success)));
            }
            IncomingFrame::AgentEvent { agent_id, event } => {
                let _ = self.events.send(HubRelayedEvent::Agent { agent: agent_id, event });
            }
            IncomingFrame::AgentState { agent_id, state } => {
                let _ = self.events.send(HubRelayedEvent::State { agent: agent_id, state });
            }
            IncomingFrame::VapidPublicKey { .. } => {
                // No correlation: a caller polling for the key re-reads it via a
                // separate accessor once a real push-subscription flow needs it.
            }
            IncomingFrame::ContextChange { agent_id, reason } => {
                let _ = self.events.send(HubRelayedEvent::ContextChange { agent: agent_id, reason });
            }
        }
    }

    /// Disconnection: reject every outstanding correlation, revert
    /// capability routing to local-only, and emit a context-change event for
    /// every currently-subscribed agent.
    pub fn handle_disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.correlations.cancel_all();
        self.tools.write().expect("lock poisoned").clear();
        let subscribed: Vec<AgentId> = self.subscriptions.read().expect("lock poisoned").iter().cloned().collect();
        if subscribed.is_empty() {
            let _ = self.events.send(HubRelayedEvent::ContextChange {
                agent: None,
                reason: "hub disconnected".into(),
            });
        }
        for agent in subscribed {
            let _ = self.events.send(HubRelayedEvent::ContextChange {
                agent: Some(agent),
                reason: "hub disconnected".into(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: StdMutex<Vec<OutgoingFrame>>,
    }

    #[async_trait]
    impl HubTransport for RecordingTransport {
        async fn send(&self, frame: OutgoingFrame) -> Result<(), HubError> {
            self.sent.lock().unwrap().push(frame);
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl HubTransport for FailingTransport {
        async fn send(&self, _frame: OutgoingFrame) -> Result<(), HubError> {
            Err(HubError::Connection("socket closed".into()))
        }
    }

    #[tokio::test]
    async fn auth_success_marks_connected() {
        let link = HubLink::new(RecordingTransport::default());
        let handle = {
            let link = &link;
            async move { link.auth("tok").await }
        };
        tokio::pin!(handle);
        tokio::task::yield_now().await;
        link.handle_incoming(IncomingFrame::AuthResult {
            id: "auth-1".into(),
            success: true,
            message: None,
        });
        handle.await.unwrap();
        assert!(link.is_connected());
    }

    #[tokio::test]
    async fn auth_failure_reports_auth_failed_and_stays_disconnected() {
        let link = HubLink::new(RecordingTransport::default());
        let handle = link.auth("bad");
        tokio::pin!(handle);
        tokio::task::yield_now().await;
        link.handle_incoming(IncomingFrame::AuthResult {
            id: "auth-1".into(),
            success: false,
            message: Some("expired token".into()),
        });
        let err = handle.await.unwrap_err();
        assert!(matches!(err, HubError::AuthFailed(_)));
        assert!(!link.is_connected());
    }

    #[tokio::test]
    async fn tool_not_in_capability_set_is_rejected_without_a_round_trip() {
        let link = HubLink::new(RecordingTransport::default());
        let err = link.call_tool(AgentId::new("a1"), "bash", Value::Null).await.unwrap_err();
        assert!(matches!(err, HubError::ToolNotRoutable(name) if name == "bash"));
    }

    #[tokio::test]
    async fn announced_tool_call_resolves_via_tool_call_result() {
        let link = HubLink::new(RecordingTransport::default());
        link.handle_incoming(IncomingFrame::AnnounceTools {
            tools: vec![HubToolSpec {
                name: "bash".into(),
                description: "run a shell command".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }],
        });
        assert!(link.is_tool_routable("bash"));

        let call = link.call_tool(AgentId::new("a1"), "bash", serde_json::json!({"cmd": "ls"}));
        tokio::pin!(call);
        tokio::task::yield_now().await;
        link.handle_incoming(IncomingFrame::ToolCallResult {
            id: "tool-1".into(),
            result: serde_json::json!("file1\nfile2"),
            is_error: false,
        });
        let result = call.await.unwrap();
        assert!(!result.is_error);
        assert_eq!(result.result, serde_json::json!("file1\nfile2"));
    }

    #[tokio::test]
    async fn fetch_round_trips_status_and_body() {
        let link = HubLink::new(RecordingTransport::default());
        let call = link.fetch("https://api.example.com/x", "GET", vec![], None);
        tokio::pin!(call);
        tokio::task::yield_now().await;
        link.handle_incoming(IncomingFrame::FetchResult {
            id: "fetch-1".into(),
            status: 200,
            body: "ok".into(),
        });
        let result = call.await.unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(result.body, "ok");
    }

    #[tokio::test]
    async fn disconnect_cancels_pending_correlations_and_clears_capabilities() {
        let link = HubLink::new(RecordingTransport::default());
        link.handle_incoming(IncomingFrame::AnnounceTools {
            tools: vec![HubToolSpec {
                name: "bash".into(),
                description: "d".into(),
                input_schema: Value::Null,
            }],
        });
        let call = link.call_tool(AgentId::new("a1"), "bash", Value::Null);
        tokio::pin!(call);
        tokio::task::yield_now().await;

        link.handle_disconnect();
        let err = call.await.unwrap_err();
        assert!(matches!(err, HubError::Cancelled));
        assert!(!link.is_tool_routable("bash"));
        assert!(!link.is_connected());
    }

    #[tokio::test]
    async fn disconnect_emits_context_change_for_every_subscribed_agent() {
        let link = HubLink::new(RecordingTransport::default());
        link.subscribe_agent(AgentId::new("a1")).await.unwrap();
        link.subscribe_agent(AgentId::new("a2")).await.unwrap();
        let mut events = link.events().await.unwrap();

        link.handle_disconnect();

        let mut seen = HashSet::new();
        for _ in 0..2 {
            match events.recv().await.unwrap() {
                HubRelayedEvent::ContextChange { agent: Some(agent), .. } => {
                    seen.insert(agent);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(seen.contains(&AgentId::new("a1")));
        assert!(seen.contains(&AgentId::new("a2")));
    }

    #[tokio::test]
    async fn agent_event_frames_are_forwarded_to_the_event_channel() {
        let link = HubLink::new(RecordingTransport::default());
        let mut events = link.events().await.unwrap();
        link.handle_incoming(IncomingFrame::AgentEvent {
            agent_id: AgentId::new("a1"),
            event: AgentEvent::TextDone { agent: AgentId::new("a1") },
        });
        match events.recv().await.unwrap() {
            HubRelayedEvent::Agent { agent, .. } => assert_eq!(agent.as_str(), "a1"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn events_can_only_be_taken_once() {
        let link = HubLink::new(RecordingTransport::default());
        assert!(link.events().await.is_some());
        assert!(link.events().await.is_none());
    }

    #[tokio::test]
    async fn transport_failure_surfaces_before_any_correlation_is_registered() {
        let link = HubLink::new(FailingTransport);
        let err = link.subscribe_agent(AgentId::new("a1")).await.unwrap_err();
        assert!(matches!(err, HubError::Connection(_)));
    }
}

impl std::fmt::Debug for HubRelayedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HubRelayedEvent::Agent { agent, .. } => write!(f, "Agent({agent})"),
            HubRelayedEvent::State { agent, .. } => write!(f, "State({agent})"),
            HubRelayedEvent::ContextChange { agent, reason } => write!(f, "ContextChange({agent:?}, {reason})"),
        }
    }
}
