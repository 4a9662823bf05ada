#![deny(missing_docs)]
//! OpenAI Chat Completions API adapter.

mod streaming;
mod types;

use flo_core::content::{ContentBlock, Message, Role};
use flo_provider::{
    CostEstimate, HttpRequestSpec, ModelInfo, Pricing, ProviderAdapter, ProviderError,
    RequestConfig, StreamParser, TokenUsage, ToolSpec,
};
use rust_decimal::Decimal;
use serde_json::Value;
use types::*;

pub use streaming::{events_from_lines, OpenAiStreamParser};

const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gpt-5",
        display_name: "GPT-5",
        context_window: 400_000,
        max_output_tokens: 128_000,
        pricing: Pricing::per_million(Decimal::new(125, 2), Decimal::new(1000, 2)),
    },
    ModelInfo {
        id: "gpt-4o-mini",
        display_name: "GPT-4o mini",
        context_window: 128_000,
        max_output_tokens: 16_384,
        pricing: Pricing::per_million(Decimal::new(15, 2), Decimal::new(60, 2)),
    },
];

/// The OpenAI Chat Completions adapter.
pub struct OpenAiAdapter;

impl Default for OpenAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiAdapter {
    /// Build a new adapter. Auth is injected by the interceptor, not held here.
    pub fn new() -> Self {
        Self
    }

    fn messages_to_wire(messages: &[Message], system: Option<&str>) -> Vec<OpenAIMessage> {
        let mut out = Vec::new();

        if let Some(system) = system {
            out.push(OpenAIMessage {
                role: "system".into(),
                content: Some(system.to_string()),
                tool_calls: None,
                tool_call_id: None,
            });
        }

        for message in messages {
            match message.role {
                Role::User => {
                    let mut tool_results = Vec::new();
                    let mut other = Vec::new();
                    for block in &message.content {
                        match block {
                            ContentBlock::ToolResult {
                                tool_use_id,
                                content,
                                ..
                            } => tool_results.push((tool_use_id.clone(), content.clone())),
                            other_block => other.push(other_block),
                        }
                    }
                    for (tool_call_id, content) in tool_results {
                        out.push(OpenAIMessage {
                            role: "tool".into(),
                            content: Some(content),
                            tool_calls: None,
                            tool_call_id: Some(tool_call_id),
                        });
                    }
                    if !other.is_empty() {
                        let text = other
                            .iter()
                            .filter_map(|b| b.as_text())
                            .collect::<Vec<_>>()
                            .join("");
                        out.push(OpenAIMessage {
                            role: "user".into(),
                            content: Some(text),
                            tool_calls: None,
                            tool_call_id: None,
                        });
                    }
                }
                Role::Assistant => {
                    let mut tool_calls = Vec::new();
                    let mut text_parts = Vec::new();
                    for block in &message.content {
                        match block {
                            ContentBlock::ToolUse { id, name, input } => {
                                tool_calls.push(OpenAIToolCall {
                                    id: id.clone(),
                                    call_type: "function".into(),
                                    function: OpenAIFunctionCall {
                                        name: name.clone(),
                                        arguments: serde_json::to_string(input).unwrap_or_default(),
                                    },
                                });
                            }
                            ContentBlock::Text { text } => text_parts.push(text.clone()),
                            _ => {}
                        }
                    }
                    out.push(OpenAIMessage {
                        role: "assistant".into(),
                        content: if text_parts.is_empty() {
                            None
                        } else {
                            Some(text_parts.join(""))
                        },
                        tool_calls: if tool_calls.is_empty() {
                            None
                        } else {
                            Some(tool_calls)
                        },
                        tool_call_id: None,
                    });
                }
            }
        }

        out
    }
}

impl ProviderAdapter for OpenAiAdapter {
    fn provider_name(&self) -> &'static str {
        "openai"
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

        let wire_tools: Vec<OpenAITool> = tools
            .iter()
            .map(|t| OpenAITool {
                tool_type: "function".into(),
                function: OpenAIFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                },
            })
            .collect();

        let request = OpenAIRequest {
            model: config.model.clone(),
            messages: Self::messages_to_wire(messages, config.system.as_deref()),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            tools: wire_tools,
            stream: true,
        };

        let body = serde_json::to_value(&request)
            .map_err(|e| ProviderError::Parse(format!("failed to serialize request: {e}")))?;

        Ok(HttpRequestSpec::streaming("/api/openai/v1/chat/completions", body)
            .with_header("content-type", "application/json"))
    }

    fn new_stream_parser(&self) -> Box<dyn StreamParser> {
        Box::new(OpenAiStreamParser::new())
    }

    fn extract_usage(&self, final_body: &Value) -> Result<TokenUsage, ProviderError> {
        let response: OpenAIResponse = serde_json::from_value(final_body.clone())
            .map_err(|e| ProviderError::Parse(format!("invalid OpenAI response: {e}")))?;
        Ok(TokenUsage {
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
            cache_read_tokens: response.usage.prompt_tokens_details.and_then(|d| d.cached_tokens),
            cache_creation_tokens: None,
        })
    }

    fn estimate_cost(&self, model: &str, usage: &TokenUsage) -> CostEstimate {
        self.model(model)
            .map(|m| m.pricing.estimate(usage))
            .unwrap_or_else(CostEstimate::zero)
    }

    fn models(&self) -> &'static [ModelInfo] {
        MODELS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_request_puts_system_prompt_first() {
        let adapter = OpenAiAdapter::new();
        let messages = vec![Message::user("hi")];
        let config = RequestConfig {
            model: "gpt-4o-mini".into(),
            system: Some("be terse".into()),
            max_tokens: Some(256),
            temperature: None,
        };
        let spec = adapter.build_request(&messages, &[], &config).unwrap();
        assert_eq!(spec.body["messages"][0]["role"], "system");
        assert_eq!(spec.body["messages"][0]["content"], "be terse");
        assert_eq!(spec.body["messages"][1]["role"], "user");
    }

    #[test]
    fn tool_result_becomes_tool_role_message() {
        let adapter = OpenAiAdapter::new();
        let messages = vec![
            Message {
                role: Role::Assistant,
                content: vec![ContentBlock::ToolUse {
                    id: "call_1".into(),
                    name: "bash".into(),
                    input: json!({"command": "ls"}),
                }],
            },
            Message {
                role: Role::User,
                content: vec![ContentBlock::ToolResult {
                    tool_use_id: "call_1".into(),
                    content: "file.txt".into(),
                    is_error: false,
                }],
            },
        ];
        let config = RequestConfig {
            model: "gpt-4o-mini".into(),
            ..Default::default()
        };
        let spec = adapter.build_request(&messages, &[], &config).unwrap();
        assert_eq!(spec.body["messages"][0]["role"], "assistant");
        assert!(spec.body["messages"][0]["tool_calls"].is_array());
        assert_eq!(spec.body["messages"][1]["role"], "tool");
        assert_eq!(spec.body["messages"][1]["tool_call_id"], "call_1");
    }

    #[test]
    fn build_request_rejects_empty_model() {
        let adapter = OpenAiAdapter::new();
        let result = adapter.build_request(&[], &[], &RequestConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn estimate_cost_uses_model_pricing() {
        let adapter = OpenAiAdapter::new();
        let usage = TokenUsage {
            input_tokens: 1_000_000,
            output_tokens: 1_000_000,
            ..Default::default()
        };
        let cost = adapter.estimate_cost("gpt-4o-mini", &usage);
        assert_eq!(cost.usd, Decimal::new(15, 2) + Decimal::new(60, 2));
    }
}
