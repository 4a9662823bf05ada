//! The adapter contract: `build_request` / stream parsing / usage+cost.

use crate::request::{HttpRequestSpec, RequestConfig, ToolSpec};
use crate::usage::{CostEstimate, ModelInfo, TokenUsage};
use flo_core::content::Message;
use serde_json::Value;
use thiserror::Error;

/// Errors from building a request, parsing a stream, or extracting usage.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// The provider rejected or failed the request (HTTP error body passed through).
    #[error("provider error: {0}")]
    Provider(String),
    /// The provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,
    /// Authentication failed (should not normally reach the adapter — the
    /// interceptor owns credentials — but surfaces a provider 401/403 passthrough).
    #[error("auth failed: {0}")]
    AuthFailed(String),
    /// The stream or response body could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// Whether retrying this request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited | ProviderError::Provider(_))
    }
}

/// One raw wire event handed to a [`StreamParser`].
///
/// For SSE transports this is one `event:`/`data:` pair (a blank line
/// terminates and dispatches the accumulated pair). For NDJSON transports
/// (Ollama) each complete line is one `RawStreamEvent` with `event_type: None`.
#[derive(Debug, Clone)]
pub struct RawStreamEvent {
    /// The SSE `event:` line, if the transport uses named events.
    pub event_type: Option<String>,
    /// The raw data payload (already joined across multi-line `data:` fields).
    pub data: String,
}

impl RawStreamEvent {
    /// Build an NDJSON-style raw event (no named event type).
    pub fn line(data: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: data.into(),
        }
    }

    /// Build an SSE-style raw event.
    pub fn sse(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            data: data.into(),
        }
    }
}

/// The canonical, provider-independent event stream a [`StreamParser`] emits.
///
/// Deliberately distinct from [`flo_core::event::AgentEvent`]: the provider
/// layer has no notion of which agent it is streaming for. `flo-loop` tags
/// each event with an `AgentId` before it reaches the relay.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum StreamEvent {
    /// An incremental chunk of assistant text.
    TextDelta(String),
    /// A tool-use block has started accumulating.
    ToolUseStart {
        /// Correlation id for the matching `ToolUseDone`.
        id: String,
        /// Tool name.
        name: String,
    },
    /// An incremental chunk of a tool call's JSON input.
    ToolUseInputDelta {
        /// Matching `ToolUseStart::id`.
        id: String,
        /// Partial JSON fragment.
        delta: String,
    },
    /// A tool-use block's input is fully assembled. Exactly one of these is
    /// emitted per `ToolUseStart`, always before the stream's `TurnEnd`.
    ToolUseDone {
        /// Matching `ToolUseStart::id`.
        id: String,
        /// Tool name (repeated for convenience — callers need not track state).
        name: String,
        /// The fully assembled input.
        input: Value,
    },
    /// Usage reported mid-stream or at stream end.
    Usage(TokenUsage),
    /// The stream ended for this turn.
    TurnEnd {
        /// `true` if the model requested tool use.
        has_tool_use: bool,
    },
    /// A stream-level error. Terminal: no further events follow.
    Error(String),
}

/// A stateful, per-stream parser. One instance is constructed per turn (via
/// [`ProviderAdapter::new_stream_parser`]) rather than reset in place, since
/// the owning adapter is typically held behind an `Arc` shared by many
/// concurrently running agents.
pub trait StreamParser: Send {
    /// Feed one raw wire event, returning zero or more canonical events.
    fn feed(&mut self, event: &RawStreamEvent) -> Vec<StreamEvent>;

    /// Called when the underlying transport ends. If the stream ended
    /// without an explicit terminal event (no `message_stop`/`done: true`
    /// ever arrived), implementations should synthesize a final
    /// `StreamEvent::TurnEnd` here so callers never hang waiting for one —
    /// a stream that ends without a `turn_end` yields a synthesized
    /// `turn_end` with stop reason `error`. The loop
    /// layer is responsible for mapping a synthesized, tool-use-free
    /// `TurnEnd` that arrives via this path to `StopReason::Error` rather
    /// than `EndTurn`.
    fn finish(&mut self) -> Vec<StreamEvent> {
        Vec::new()
    }
}

/// Translates between the canonical model and one concrete provider's wire
/// protocol. Object-safe: the relay and loop hold `Arc<dyn ProviderAdapter>`
/// selected at runtime by `AgentConfig::provider`.
pub trait ProviderAdapter: Send + Sync {
    /// The provider name as it appears in `/api/<provider>/...` and in
    /// `AgentConfig::provider`.
    fn provider_name(&self) -> &'static str;

    /// Convert a canonical conversation + tool set into a wire request.
    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        config: &RequestConfig,
    ) -> Result<HttpRequestSpec, ProviderError>;

    /// Construct a fresh stateful parser for one stream.
    fn new_stream_parser(&self) -> Box<dyn StreamParser>;

    /// Extract usage from a non-streaming final response body (providers
    /// that don't report usage incrementally via `StreamEvent::Usage`).
    fn extract_usage(&self, final_body: &Value) -> Result<TokenUsage, ProviderError>;

    /// Estimate the USD cost of a usage figure for the given model.
    fn estimate_cost(&self, model: &str, usage: &TokenUsage) -> CostEstimate;

    /// This adapter's hardcoded model registry.
    fn models(&self) -> &'static [ModelInfo];

    /// Look up one model by id.
    fn model(&self, id: &str) -> Option<&'static ModelInfo> {
        self.models().iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn ProviderAdapter) {}
    fn _assert_parser_object_safe(_: &dyn StreamParser) {}

    #[test]
    fn raw_stream_event_line_has_no_event_type() {
        let e = RawStreamEvent::line("{}");
        assert!(e.event_type.is_none());
    }

    #[test]
    fn provider_error_rate_limited_is_retryable() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(!ProviderError::AuthFailed("x".into()).is_retryable());
    }

    struct DefaultFinishParser;
    impl StreamParser for DefaultFinishParser {
        fn feed(&mut self, _event: &RawStreamEvent) -> Vec<StreamEvent> {
            Vec::new()
        }
    }

    #[test]
    fn default_finish_impl_produces_no_events() {
        let mut p = DefaultFinishParser;
        assert!(p.finish().is_empty());
    }
}
