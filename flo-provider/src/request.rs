//! Canonical request shapes passed into a [`crate::adapter::ProviderAdapter`].

use serde_json::Value;

/// A tool's schema, as the loop's registry exposes it to the provider layer.
///
/// This is the provider-independent shape; each adapter's `mapping` converts
/// it to the wire shape its provider expects (uppercased types, a
/// `functionDeclarations` envelope, raw JSON Schema, ...) without leaking
/// that conversion above the adapter boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    /// Tool name, as registered.
    pub name: String,
    /// Human-readable description surfaced to the model.
    pub description: String,
    /// JSON Schema describing valid input.
    pub input_schema: Value,
}

impl ToolSpec {
    /// Build a new tool spec.
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Per-request overrides passed to `build_request`, distinct from
/// `flo_core::operator::OperatorConfig` — this is the subset that affects
/// the wire request itself, not loop-level accounting.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct RequestConfig {
    /// Model id to request.
    pub model: String,
    /// System prompt text, if any.
    pub system: Option<String>,
    /// Hard cap on output tokens for this request.
    pub max_tokens: Option<u32>,
    /// Sampling temperature, if the caller wants to override the provider default.
    pub temperature: Option<f32>,
}

/// The fully-assembled HTTP request an adapter wants issued.
///
/// `url` is always under `/api/<provider>/...` — per the design, auth
/// injection and any host rewriting happen in the interceptor, not here.
#[derive(Debug, Clone)]
pub struct HttpRequestSpec {
    /// Request path, always rooted at `/api/<provider>/...`.
    pub url: String,
    /// Headers the adapter itself wants set (content-type, provider-specific
    /// version headers); auth headers are added later by the interceptor.
    pub headers: Vec<(String, String)>,
    /// The JSON request body.
    pub body: Value,
    /// Whether the response is a stream (SSE / NDJSON) or a single JSON body.
    pub streaming: bool,
}

impl HttpRequestSpec {
    /// Build a new streaming request spec.
    pub fn streaming(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
            streaming: true,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
