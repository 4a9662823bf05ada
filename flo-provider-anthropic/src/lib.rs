#![deny(missing_docs)]
//! Anthropic Messages API adapter.

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

pub use streaming::{events_from_lines, AnthropicStreamParser};

const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "claude-opus-4-5-20251101",
        display_name: "Claude Opus 4.5",
        context_window: 200_000,
        max_output_tokens: 64_000,
        pricing: Pricing::per_million(Decimal::new(500, 2), Decimal::new(2500, 2)),
    },
    ModelInfo {
        id: "claude-sonnet-4-5-20250929",
        display_name: "Claude Sonnet 4.5",
        context_window: 200_000,
        max_output_tokens: 64_000,
        pricing: Pricing::per_million(Decimal::new(300, 2), Decimal::new(1500, 2)),
    },
    ModelInfo {
        id: "claude-haiku-4-5-20251001",
        display_name: "Claude Haiku 4.5",
        context_window: 200_000,
        max_output_tokens: 64_000,
        pricing: Pricing::per_million(Decimal::new(25, 2), Decimal::new(125, 2)),
    },
];

/// The Anthropic Messages API adapter.
pub struct AnthropicAdapter {
    api_version: String,
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AnthropicAdapter {
    /// Build a new adapter. Auth is injected by the interceptor, not held here.
    pub fn new() -> Self {
        Self {
            api_version: "2023-06-01".into(),
        }
    }

    fn message_to_wire(message: &Message) -> AnthropicMessage {
        AnthropicMessage {
            role: match message.role {
                Role::User => "user".into(),
                Role::Assistant => "assistant".into(),
            },
            content: message.content.iter().map(Self::block_to_wire).collect(),
        }
    }

    fn block_to_wire(block: &ContentBlock) -> AnthropicContentBlock {
        match block {
            ContentBlock::Text { text } => AnthropicContentBlock::Text { text: text.clone() },
            ContentBlock::ToolUse { id, name, input } => AnthropicContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => AnthropicContentBlock::ToolResult {
                tool_use_id: tool_use_id.clone(),
                content: content.clone(),
                is_error: *is_error,
            },
        }
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn provider_name(&self) -> &'static str {
        "anthropic"
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

        let wire_messages: Vec<AnthropicMessage> = messages.iter().map(Self::message_to_wire).collect();
        let wire_tools: Vec<AnthropicTool> = tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect();

        let request = AnthropicRequest {
            model: config.model.clone(),
            max_tokens: config.max_tokens.unwrap_or(4096),
            messages: wire_messages,
            system: config.system.clone(),
            tools: wire_tools,
            temperature: config.temperature,
            stream: true,
        };

        let body = serde_json::to_value(&request)
            .map_err(|e| ProviderError::Parse(format!("failed to serialize request: {e}")))?;

        Ok(HttpRequestSpec::streaming("/api/anthropic/v1/messages", body)
            .with_header("anthropic-version", &self.api_version)
            .with_header("content-type", "application/json"))
    }

    fn new_stream_parser(&self) -> Box<dyn StreamParser> {
        Box::new(AnthropicStreamParser::new())
    }

    fn extract_usage(&self, final_body: &Value) -> Result<TokenUsage, ProviderError> {
        let response: AnthropicResponse = serde_json::from_value(final_body.clone())
            .map_err(|e| ProviderError::Parse(format!("invalid Anthropic response: {e}")))?;
        Ok(TokenUsage {
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
            cache_read_tokens: response.usage.cache_read_input_tokens,
            cache_creation_tokens: response.usage.cache_creation_input_tokens,
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
    fn build_request_maps_system_and_tools() {
        let adapter = AnthropicAdapter::new();
        let messages = vec![Message::user("hi")];
        let tools = vec![ToolSpec::new("search", "web search", json!({"type": "object"}))];
        let config = RequestConfig {
            model: "claude-haiku-4-5-20251001".into(),
            system: Some("be terse".into()),
            max_tokens: Some(256),
            temperature: None,
        };
        let spec = adapter.build_request(&messages, &tools, &config).unwrap();
        assert_eq!(spec.url, "/api/anthropic/v1/messages");
        assert!(spec.streaming);
        assert_eq!(spec.body["system"], "be terse");
        assert_eq!(spec.body["max_tokens"], 256);
        assert_eq!(spec.body["tools"][0]["name"], "search");
    }

    #[test]
    fn build_request_rejects_empty_model() {
        let adapter = AnthropicAdapter::new();
        let config = RequestConfig::default();
        let result = adapter.build_request(&[], &[], &config);
        assert!(result.is_err());
    }

    #[test]
    fn estimate_cost_uses_model_pricing() {
        let adapter = AnthropicAdapter::new();
        let usage = TokenUsage {
            input_tokens: 1_000_000,
            output_tokens: 1_000_000,
            ..Default::default()
        };
        let cost = adapter.estimate_cost("claude-haiku-4-5-20251001", &usage);
        assert_eq!(cost.usd, Decimal::new(25, 2) + Decimal::new(125, 2));
    }

    #[test]
    fn estimate_cost_unknown_model_is_zero() {
        let adapter = AnthropicAdapter::new();
        let usage = TokenUsage::default();
        assert_eq!(adapter.estimate_cost("not-a-model", &usage), CostEstimate::zero());
    }

    #[test]
    fn extract_usage_reads_response_body() {
        let adapter = AnthropicAdapter::new();
        let body = json!({
            "content": [],
            "model": "claude-haiku-4-5-20251001",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });
        let usage = adapter.extract_usage(&body).unwrap();
        assert_eq!(usage.input_tokens, 10);
        assert_eq!(usage.output_tokens, 5);
    }
}
