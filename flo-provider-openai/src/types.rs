//! OpenAI Chat Completions API wire shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAI API request body.
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<OpenAIMessage>,
    /// Maximum completion tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Tools available to the model.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<OpenAITool>,
    /// Always `true`; we only speak the streaming wire format.
    pub stream: bool,
}

/// A message in OpenAI's wire format.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIMessage {
    /// `"system"`, `"user"`, `"assistant"`, or `"tool"`.
    pub role: String,
    /// Message text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls the assistant requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAIToolCall>>,
    /// The tool call id this message answers (only set on `role: "tool"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// A tool call requested by the assistant.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIToolCall {
    /// Correlation id.
    pub id: String,
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub call_type: String,
    /// The function invocation.
    pub function: OpenAIFunctionCall,
}

/// A function invocation.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OpenAIFunctionCall {
    /// Function name.
    #[serde(default)]
    pub name: String,
    /// JSON-encoded arguments (a string, not a nested object, per the wire format).
    #[serde(default)]
    pub arguments: String,
}

/// A tool definition for the OpenAI API.
#[derive(Debug, Serialize)]
pub struct OpenAITool {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The function schema.
    pub function: OpenAIFunction,
}

/// Function schema for a tool definition.
#[derive(Debug, Serialize)]
pub struct OpenAIFunction {
    /// Function name.
    pub name: String,
    /// Function description surfaced to the model.
    pub description: String,
    /// JSON Schema parameters.
    pub parameters: Value,
}

/// Token usage as reported by the OpenAI API.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct OpenAIUsage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Completion tokens.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Cached-token breakdown, if reported.
    #[serde(default)]
    pub prompt_tokens_details: Option<OpenAIPromptTokensDetails>,
}

/// Cached prompt token breakdown.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct OpenAIPromptTokensDetails {
    /// Tokens served from cache.
    #[serde(default)]
    pub cached_tokens: Option<u64>,
}

/// A non-streaming response body, used by `extract_usage`.
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// The model that generated the response.
    pub model: String,
    /// Token usage.
    pub usage: OpenAIUsage,
}
