//! Ollama `/api/chat` wire shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ollama chat request body.
#[derive(Debug, Serialize)]
pub struct OllamaRequest {
    /// Model identifier (e.g. `"llama3.2:1b"`).
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<OllamaMessage>,
    /// Tools available to the model.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<OllamaTool>,
    /// Always `true`; we only speak the streaming wire format.
    pub stream: bool,
    /// How long Ollama keeps the model loaded after this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    /// Sampling options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

/// Per-request sampling options.
#[derive(Debug, Serialize, Default)]
pub struct OllamaOptions {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to predict.
    #[serde(skip_serializing_if = "Option::is_none", rename = "num_predict")]
    pub num_predict: Option<u32>,
}

/// A message in Ollama's wire format.
#[derive(Debug, Serialize, Deserialize)]
pub struct OllamaMessage {
    /// `"system"`, `"user"`, or `"assistant"`.
    pub role: String,
    /// Message text content.
    #[serde(default)]
    pub content: String,
    /// Tool calls the assistant requested.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tool_calls: Option<Vec<OllamaToolCall>>,
}

/// A tool call as reported by Ollama (always fully assembled, never partial).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaToolCall {
    /// The function invocation.
    pub function: OllamaFunctionCall,
}

/// A function invocation.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OllamaFunctionCall {
    /// Function name.
    #[serde(default)]
    pub name: String,
    /// Arguments, already a JSON object (not a JSON-encoded string, unlike OpenAI).
    #[serde(default)]
    pub arguments: Value,
}

/// A tool definition for the Ollama API.
#[derive(Debug, Serialize)]
pub struct OllamaTool {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The function schema.
    pub function: OllamaFunction,
}

/// Function schema for a tool definition.
#[derive(Debug, Serialize)]
pub struct OllamaFunction {
    /// Function name.
    pub name: String,
    /// Function description surfaced to the model.
    pub description: String,
    /// JSON Schema parameters.
    pub parameters: Value,
}

/// A non-streaming response body, used by `extract_usage`.
#[derive(Debug, Deserialize)]
pub struct OllamaResponse {
    /// The model that generated the response.
    #[serde(default)]
    pub model: String,
    /// Prompt tokens evaluated.
    #[serde(default)]
    pub prompt_eval_count: u64,
    /// Completion tokens generated.
    #[serde(default)]
    pub eval_count: u64,
}
