#![deny(missing_docs)]
//! Ollama local-model adapter.
//!
//! Ollama runs models locally: there is no auth header to inject and cost is
//! always zero.

mod streaming;
mod types;

use flo_core::content::{ContentBlock, Message, Role};
use flo_provider::{
    CostEstimate, HttpRequestSpec, ModelInfo, Pricing, ProviderAdapter, ProviderError,
    RequestConfig, StreamParser, TokenUsage, ToolSpec,
};
use serde_json::Value;
use types::*;

pub use streaming::{events_from_lines, OllamaStreamParser};

const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "llama3.2:1b",
        display_name: "Llama 3.2 1B",
        context_window: 128_000,
        max_output_tokens: 8_192,
        pricing: Pricing::ZERO,
    },
    ModelInfo {
        id: "qwen2.5:7b",
        display_name: "Qwen 2.5 7B",
        context_window: 32_768,
        max_output_tokens: 8_192,
        pricing: Pricing::ZERO,
    },
];

/// The Ollama `/api/chat` adapter.
pub struct OllamaAdapter {
    keep_alive: Option<String>,
}

impl Default for OllamaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaAdapter {
    /// Build a new adapter against the default local endpoint.
    pub fn new() -> Self {
        Self { keep_alive: None }
    }

    /// Set how long Ollama keeps the model resident after this request
    /// (`"5m"`, `"0"` to unload immediately, `"-1"` to keep forever).
    pub fn with_keep_alive(mut self, duration: impl Into<String>) -> Self {
        self.keep_alive = Some(duration.into());
        self
    }

    fn messages_to_wire(messages: &[Message], system: Option<&str>) -> Vec<OllamaMessage> {
        let mut out = Vec::new();

        if let Some(system) = system {
            out.push(OllamaMessage {
                role: "system".into(),
                content: system.to_string(),
                tool_calls: None,
            });
        }

        for message in messages {
            match message.role {
                Role::User => {
                    let text = message
                        .content
                        .iter()
                        .filter_map(ContentBlock::as_text)
                        .collect::<Vec<_>>()
                        .join("");
                    let tool_results: Vec<&str> = message
                        .content
                        .iter()
                        .filter_map(|b| match b {
                            ContentBlock::ToolResult { content, .. } => Some(content.as_str()),
                            _ => None,
                        })
                        .collect();
                    for result in tool_results {
                        out.push(OllamaMessage {
                            role: "tool".into(),
                            content: result.to_string(),
                            tool_calls: None,
                        });
                    }
                    if !text.is_empty() {
                        out.push(OllamaMessage {
                            role: "user".into(),
                            content: text,
                            tool_calls: None,
                        });
                    }
                }
                Role::Assistant => {
                    let text = message.text();
                    let tool_calls: Vec<OllamaToolCall> = message
                        .content
                        .iter()
                        .filter_map(|b| match b {
                            ContentBlock::ToolUse { name, input, .. } => Some(OllamaToolCall {
                                function: OllamaFunctionCall {
                                    name: name.clone(),
                                    arguments: input.clone(),
                                },
                            }),
                            _ => None,
                        })
                        .collect();
                    out.push(OllamaMessage {
                        role: "assistant".into(),
                        content: text,
                        tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
                    });
                }
            }
        }

        out
    }
}

impl ProviderAdapter for OllamaAdapter {
    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        config: &RequestConfig,
    ) -> Result<HttpRequestSpec, ProviderError> {
        if config.model.is_empty() {
            return Err(ProviderError::Parse("request config is missing a model id".into()));
        }

        let wire_tools: Vec<OllamaTool> = tools
            .iter()
            .map(|t| OllamaTool {
                tool_type: "function".into(),
                function: OllamaFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                },
            })
            .collect();

        let options = if config.temperature.is_some() || config.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            })
        } else {
            None
        };

        let request = OllamaRequest {
            model: config.model.clone(),
            messages: Self::messages_to_wire(messages, config.system.as_deref()),
            tools: wire_tools,
            stream: true,
            keep_alive: self.keep_alive.clone(),
            options,
        };

        let body = serde_json::to_value(&request)
            .map_err(|e| ProviderError::Parse(format!("failed to serialize request: {e}")))?;

        Ok(HttpRequestSpec::streaming("/api/ollama/api/chat", body)
            .with_header("content-type", "application/json"))
    }

    fn new_stream_parser(&self) -> Box<dyn StreamParser> {
        Box::new(OllamaStreamParser::new())
    }

    fn extract_usage(&self, final_body: &Value) -> Result<TokenUsage, ProviderError> {
        let response: OllamaResponse = serde_json::from_value(final_body.clone())
            .map_err(|e| ProviderError::Parse(format!("invalid Ollama response: {e}")))?;
        Ok(TokenUsage {
            input_tokens: response.prompt_eval_count,
            output_tokens: response.eval_count,
            cache_read_tokens: None,
            cache_creation_tokens: None,
        })
    }

    fn estimate_cost(&self, _model: &str, _usage: &TokenUsage) -> CostEstimate {
        CostEstimate::zero()
    }

    fn models(&self) -> &'static [ModelInfo] {
        MODELS
    }
}
