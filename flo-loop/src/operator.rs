//! The ReAct-style streaming loop: one [`Operator`] implementation driving a
//! provider stream, effect tools, externally-routed tools, and hooks through
//! to a stop condition.

use crate::config::{LoopConfig, ResolvedConfig};
use crate::context::ContextStrategy;
use crate::effects::{self, effect_tool_schemas};
use crate::tool_exec::ToolExecutor;
use crate::transport::ApiTransport;
use async_trait::async_trait;
use flo_core::content::{ContentBlock, Message, Role};
use flo_core::effect::{Effect, LogLevel};
use flo_core::hook::{HookAction, HookContext, HookPoint};
use flo_core::operator::{
    ExitReason, Operator, OperatorError, OperatorInput, OperatorMetadata, OperatorOutput,
    ToolCallRecord,
};
use flo_hooks::HookRegistry;
use flo_provider::adapter::ProviderAdapter;
use flo_provider::request::RequestConfig;
use flo_provider::usage::TokenUsage;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;

fn last_assistant_text(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(Message::text)
        .unwrap_or_default()
}

struct PendingToolUse {
    id: String,
    name: String,
    input: Option<Value>,
}

/// Accumulates one turn's streamed events into a finished shape.
struct TurnAccumulator {
    text: String,
    tool_uses: Vec<PendingToolUse>,
    usage: TokenUsage,
    turn_end: Option<bool>,
    synthesized: bool,
    error: Option<String>,
}

impl TurnAccumulator {
    fn new() -> Self {
        Self {
            text: String::new(),
            tool_uses: Vec::new(),
            usage: TokenUsage::default(),
            turn_end: None,
            synthesized: false,
            error: None,
        }
    }

    fn apply(&mut self, event: flo_provider::adapter::StreamEvent, via_finish: bool) {
        use flo_provider::adapter::StreamEvent;
        match event {
            StreamEvent::TextDelta(delta) => self.text.push_str(&delta),
            StreamEvent::ToolUseStart { id, name } => {
                self.tool_uses.push(PendingToolUse { id, name, input: None });
            }
            StreamEvent::ToolUseInputDelta { .. } => {
                // The canonical event contract guarantees a matching
                // `ToolUseDone` carries the fully assembled input; partial
                // deltas exist only for UI-style incremental rendering.
            }
            StreamEvent::ToolUseDone { id, name, input } => {
                if let Some(existing) = self.tool_uses.iter_mut().find(|t| t.id == id) {
                    existing.name = name;
                    existing.input = Some(input);
                } else {
                    self.tool_uses.push(PendingToolUse {
                        id,
                        name,
                        input: Some(input),
                    });
                }
            }
            StreamEvent::Usage(usage) => self.usage = usage,
            StreamEvent::TurnEnd { has_tool_use } => {
                self.turn_end = Some(has_tool_use);
                self.synthesized = via_finish;
            }
            StreamEvent::Error(message) => self.error = Some(message),
            _ => {}
        }
    }

    fn done(&self) -> bool {
        self.turn_end.is_some() || self.error.is_some()
    }
}

/// One completed turn's worth of accounting, ready to fold into the run.
struct TurnOutcome {
    text: String,
    tool_uses: Vec<(String, String, Value)>,
    has_tool_use: bool,
    usage: TokenUsage,
    cost: Decimal,
}

/// A ReAct-style agentic loop: stream the model, execute requested tools,
/// repeat until the model stops asking for tool use or a limit is hit.
///
/// Generic over nothing — every collaborator is an `Arc<dyn Trait>`, so one
/// `ReactOperator` value can be shared behind `Arc<dyn Operator>` without the
/// caller needing to know which provider or tool set it was built with.
pub struct ReactOperator {
    adapter: Arc<dyn ProviderAdapter>,
    transport: Arc<dyn ApiTransport>,
    tools: Arc<dyn ToolExecutor>,
    hooks: Arc<HookRegistry>,
    context_strategy: Arc<dyn ContextStrategy>,
    config: LoopConfig,
}

impl ReactOperator {
    /// Build a new loop from its collaborators and static configuration.
    pub fn new(
        adapter: Arc<dyn ProviderAdapter>,
        transport: Arc<dyn ApiTransport>,
        tools: Arc<dyn ToolExecutor>,
        hooks: Arc<HookRegistry>,
        context_strategy: Arc<dyn ContextStrategy>,
        config: LoopConfig,
    ) -> Self {
        Self {
            adapter,
            transport,
            tools,
            hooks,
            context_strategy,
            config,
        }
    }

    fn tool_specs(&self, resolved: &ResolvedConfig) -> Vec<flo_provider::request::ToolSpec> {
        let mut specs = effect_tool_schemas();
        let executor_specs = self.tools.tool_specs();
        match &resolved.allowed_tools {
            Some(allowed) => {
                specs.extend(executor_specs.into_iter().filter(|t| allowed.contains(&t.name)));
            }
            None => specs.extend(executor_specs),
        }
        specs
    }

    async fn run_turn(
        &self,
        messages: &[Message],
        resolved: &ResolvedConfig,
    ) -> Result<TurnOutcome, OperatorError> {
        let tools = self.tool_specs(resolved);
        let mut request_config = RequestConfig::default();
        request_config.model = resolved.model.clone();
        request_config.system = resolved.system.clone();
        request_config.max_tokens = resolved.max_output_tokens;
        request_config.temperature = resolved.temperature;

        let spec = self
            .adapter
            .build_request(messages, &tools, &request_config)
            .map_err(|e| OperatorError::Model(e.to_string()))?;

        let mut rx = self
            .transport
            .send(spec)
            .await
            .map_err(map_provider_error)?;

        let mut parser = self.adapter.new_stream_parser();
        let mut acc = TurnAccumulator::new();
        let mut transport_err_retryable = false;

        while let Some(item) = rx.recv().await {
            match item {
                Ok(raw) => {
                    for event in parser.feed(&raw) {
                        acc.apply(event, false);
                    }
                }
                Err(e) => {
                    transport_err_retryable = e.is_retryable();
                    acc.error = Some(e.to_string());
                }
            }
            if acc.done() {
                break;
            }
        }

        if !acc.done() {
            for event in parser.finish() {
                acc.apply(event, true);
            }
        }

        if let Some(message) = acc.error {
            return Err(if transport_err_retryable {
                OperatorError::Retryable(message)
            } else {
                OperatorError::Model(message)
            });
        }

        let has_tool_use = match acc.turn_end {
            Some(has_tool_use) => has_tool_use,
            None => {
                return Err(OperatorError::Model(
                    "stream ended without a turn_end event".to_string(),
                ))
            }
        };

        if acc.synthesized && !has_tool_use {
            return Err(OperatorError::Model(
                "stream ended unexpectedly before completing the turn".to_string(),
            ));
        }

        let cost = self.adapter.estimate_cost(&resolved.model, &acc.usage).usd;
        let tool_uses = acc
            .tool_uses
            .into_iter()
            .map(|t| (t.id, t.name, t.input.unwrap_or(Value::Null)))
            .collect();

        Ok(TurnOutcome {
            text: acc.text,
            tool_uses,
            has_tool_use,
            usage: acc.usage,
            cost,
        })
    }

    /// Run the `Stop` hook, fold any veto into `exit_reason`, and assemble
    /// the final `OperatorOutput`. Every exit path runs through here — the
    /// `Stop` hook point fires "before the loop stops" regardless of why.
    async fn finish(
        &self,
        messages: &[Message],
        exit_reason: ExitReason,
        turns_used: u32,
        tokens_in: u64,
        tokens_out: u64,
        cost: Decimal,
        tools_called: Vec<ToolCallRecord>,
        effects: Vec<Effect>,
        final_text: Option<String>,
    ) -> OperatorOutput {
        let mut stop_ctx = HookContext::new(HookPoint::Stop);
        stop_ctx.tokens_used = tokens_in + tokens_out;
        stop_ctx.cost = cost;
        stop_ctx.turns_completed = turns_used;

        let exit_reason = match self.hooks.dispatch(&stop_ctx).await {
            HookAction::Deny { reason } => ExitReason::ObserverHalt { reason },
            _ => exit_reason,
        };

        let text = final_text.unwrap_or_else(|| last_assistant_text(messages));
        let message = Message::assistant(text);
        let metadata = OperatorMetadata {
            tokens_in,
            tokens_out,
            cost,
            turns_used,
            tools_called,
        };
        let mut output = OperatorOutput::new(message, exit_reason, metadata);
        output.effects = effects;
        output
    }
}

fn map_provider_error(e: flo_provider::adapter::ProviderError) -> OperatorError {
    if e.is_retryable() {
        OperatorError::Retryable(e.to_string())
    } else {
        OperatorError::Model(e.to_string())
    }
}

#[async_trait]
impl Operator for ReactOperator {
    async fn execute(&self, input: OperatorInput) -> Result<OperatorOutput, OperatorError> {
        let resolved = ResolvedConfig::resolve(&self.config, input.config.as_ref());
        let mut messages = vec![input.message];

        let mut turns_used: u32 = 0;
        let mut cost = Decimal::ZERO;
        let mut tokens_in: u64 = 0;
        let mut tokens_out: u64 = 0;
        let mut tools_called: Vec<ToolCallRecord> = Vec::new();
        let mut effects: Vec<Effect> = Vec::new();

        let context_window = self
            .adapter
            .model(&resolved.model)
            .map(|m| m.context_window as usize)
            .unwrap_or(self.config.fallback_context_window as usize);

        loop {
            if turns_used >= resolved.max_turns {
                return Ok(self
                    .finish(
                        &messages,
                        ExitReason::MaxTurns,
                        turns_used,
                        tokens_in,
                        tokens_out,
                        cost,
                        tools_called,
                        effects,
                        None,
                    )
                    .await);
            }
            if let Some(limit) = resolved.max_cost {
                if cost > limit {
                    return Ok(self
                        .finish(
                            &messages,
                            ExitReason::BudgetExhausted,
                            turns_used,
                            tokens_in,
                            tokens_out,
                            cost,
                            tools_called,
                            effects,
                            None,
                        )
                        .await);
                }
            }

            let mut turn_start_ctx = HookContext::new(HookPoint::TurnStart);
            turn_start_ctx.tokens_used = tokens_in + tokens_out;
            turn_start_ctx.cost = cost;
            turn_start_ctx.turns_completed = turns_used;
            if let HookAction::Deny { reason } = self.hooks.dispatch(&turn_start_ctx).await {
                return Ok(self
                    .finish(
                        &messages,
                        ExitReason::ObserverHalt { reason },
                        turns_used,
                        tokens_in,
                        tokens_out,
                        cost,
                        tools_called,
                        effects,
                        None,
                    )
                    .await);
            }

            if self.context_strategy.should_compact(&messages, context_window) {
                messages = self.context_strategy.compact(messages);
                effects.push(Effect::Log {
                    level: LogLevel::Info,
                    message: format!("context compacted via {}", self.context_strategy.name()),
                    data: None,
                });
            }

            let outcome = self.run_turn(&messages, &resolved).await?;
            turns_used += 1;
            tokens_in += outcome.usage.input_tokens;
            tokens_out += outcome.usage.output_tokens;
            cost += outcome.cost;

            if !outcome.has_tool_use {
                return Ok(self
                    .finish(
                        &messages,
                        ExitReason::Complete,
                        turns_used,
                        tokens_in,
                        tokens_out,
                        cost,
                        tools_called,
                        effects,
                        Some(outcome.text),
                    )
                    .await);
            }

            let mut assistant_blocks = Vec::new();
            if !outcome.text.is_empty() {
                assistant_blocks.push(ContentBlock::text(outcome.text.clone()));
            }
            for (id, name, input) in &outcome.tool_uses {
                assistant_blocks.push(ContentBlock::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                });
            }
            messages.push(Message {
                role: Role::Assistant,
                content: assistant_blocks,
            });

            let mut result_blocks = Vec::new();
            for (id, name, input) in outcome.tool_uses {
                let mut pre_ctx = HookContext::new(HookPoint::PreToolUse);
                pre_ctx.tool_name = Some(name.clone());
                pre_ctx.tool_input = Some(input.clone());
                pre_ctx.tokens_used = tokens_in + tokens_out;
                pre_ctx.cost = cost;
                pre_ctx.turns_completed = turns_used;

                if let HookAction::Deny { reason } = self.hooks.dispatch(&pre_ctx).await {
                    result_blocks.push(ContentBlock::tool_error(id.clone(), reason));
                    tools_called.push(ToolCallRecord::new(name.clone(), false));
                    continue;
                }

                if effects::is_effect_tool(&name) {
                    match effects::build_effect(&name, &input) {
                        Ok(effect) => {
                            effects.push(effect);
                            result_blocks.push(ContentBlock::ToolResult {
                                tool_use_id: id.clone(),
                                content: "ok".to_string(),
                                is_error: false,
                            });
                            tools_called.push(ToolCallRecord::new(name.clone(), true));
                        }
                        Err(message) => {
                            result_blocks.push(ContentBlock::tool_error(id.clone(), message));
                            tools_called.push(ToolCallRecord::new(name.clone(), false));
                        }
                    }
                    continue;
                }

                let (content, is_error, success) = match self.tools.call(&name, input.clone()).await
                {
                    Ok(value) => (value.to_string(), false, true),
                    Err(e) => (e.to_string(), true, false),
                };

                let mut post_ctx = HookContext::new(HookPoint::PostToolUse);
                post_ctx.tool_name = Some(name.clone());
                post_ctx.tool_input = Some(input.clone());
                post_ctx.tool_result = Some(content.clone());
                post_ctx.tokens_used = tokens_in + tokens_out;
                post_ctx.cost = cost;
                post_ctx.turns_completed = turns_used;

                let (final_content, final_is_error) = match self.hooks.dispatch(&post_ctx).await {
                    HookAction::Deny { reason } => (reason, true),
                    HookAction::Script { replacement } => (replacement.to_string(), is_error),
                    _ => (content, is_error),
                };
                tools_called.push(ToolCallRecord::new(name.clone(), success && !final_is_error));
                result_blocks.push(ContentBlock::ToolResult {
                    tool_use_id: id,
                    content: final_content,
                    is_error: final_is_error,
                });
            }
            messages.push(Message {
                role: Role::User,
                content: result_blocks,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoCompaction;
    use crate::tool_exec::NoTools;
    use crate::transport::test_support::ScriptedTransport;
    use flo_provider::adapter::{ProviderError, RawStreamEvent, StreamEvent, StreamParser};
    use flo_provider::request::HttpRequestSpec;
    use flo_provider::usage::{CostEstimate, ModelInfo, Pricing};
    use flo_core::operator::TriggerType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn _assert_object_safe(_: &dyn Operator) {}

    /// A stream parser that interprets each `RawStreamEvent::data` as one
    /// canonical `StreamEvent` via a tiny tagged-JSON scheme, for the test
    /// adapter below.
    struct FakeParser;

    impl StreamParser for FakeParser {
        fn feed(&mut self, event: &RawStreamEvent) -> Vec<StreamEvent> {
            let value: Value = serde_json::from_str(&event.data).expect("valid test event json");
            match value["kind"].as_str().unwrap() {
                "text" => vec![StreamEvent::TextDelta(value["text"].as_str().unwrap().to_string())],
                "tool_use" => vec![StreamEvent::ToolUseStart {
                    id: value["id"].as_str().unwrap().to_string(),
                    name: value["name"].as_str().unwrap().to_string(),
                }, StreamEvent::ToolUseDone {
                    id: value["id"].as_str().unwrap().to_string(),
                    name: value["name"].as_str().unwrap().to_string(),
                    input: value["input"].clone(),
                }],
                "usage" => vec![StreamEvent::Usage(TokenUsage {
                    input_tokens: value["input_tokens"].as_u64().unwrap(),
                    output_tokens: value["output_tokens"].as_u64().unwrap(),
                    ..Default::default()
                })],
                "turn_end" => vec![StreamEvent::TurnEnd {
                    has_tool_use: value["has_tool_use"].as_bool().unwrap(),
                }],
                "error" => vec![StreamEvent::Error(value["message"].as_str().unwrap().to_string())],
                other => panic!("unknown fake event kind {other}"),
            }
        }
    }

    static FAKE_MODELS: &[ModelInfo] = &[ModelInfo {
        id: "fake-model",
        display_name: "Fake Model",
        context_window: 100_000,
        max_output_tokens: 4096,
        pricing: Pricing::ZERO,
    }];

    struct FakeAdapter;

    impl ProviderAdapter for FakeAdapter {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        fn build_request(
            &self,
            _messages: &[Message],
            _tools: &[flo_provider::request::ToolSpec],
            _config: &RequestConfig,
        ) -> Result<HttpRequestSpec, ProviderError> {
            Ok(HttpRequestSpec::streaming("/api/fake/v1/messages", Value::Null))
        }

        fn new_stream_parser(&self) -> Box<dyn StreamParser> {
            Box::new(FakeParser)
        }

        fn extract_usage(&self, _final_body: &Value) -> Result<TokenUsage, ProviderError> {
            Ok(TokenUsage::default())
        }

        fn estimate_cost(&self, _model: &str, usage: &TokenUsage) -> CostEstimate {
            Pricing::ZERO.estimate(usage)
        }

        fn models(&self) -> &'static [ModelInfo] {
            FAKE_MODELS
        }
    }

    fn text_event(s: &str) -> Result<RawStreamEvent, ProviderError> {
        Ok(RawStreamEvent::line(
            serde_json::json!({"kind": "text", "text": s}).to_string(),
        ))
    }

    fn tool_use_event(id: &str, name: &str, input: Value) -> Result<RawStreamEvent, ProviderError> {
        Ok(RawStreamEvent::line(
            serde_json::json!({"kind": "tool_use", "id": id, "name": name, "input": input})
                .to_string(),
        ))
    }

    fn usage_event(input_tokens: u64, output_tokens: u64) -> Result<RawStreamEvent, ProviderError> {
        Ok(RawStreamEvent::line(
            serde_json::json!({"kind": "usage", "input_tokens": input_tokens, "output_tokens": output_tokens})
                .to_string(),
        ))
    }

    fn turn_end_event(has_tool_use: bool) -> Result<RawStreamEvent, ProviderError> {
        Ok(RawStreamEvent::line(
            serde_json::json!({"kind": "turn_end", "has_tool_use": has_tool_use}).to_string(),
        ))
    }

    fn simple_completion_script(text: &str) -> Vec<Result<RawStreamEvent, ProviderError>> {
        vec![
            text_event(text),
            usage_event(10, 5),
            turn_end_event(false),
        ]
    }

    fn make_operator(
        transport: ScriptedTransport,
        tools: Arc<dyn ToolExecutor>,
        hooks: HookRegistry,
        max_turns: u32,
        max_cost: Option<Decimal>,
    ) -> ReactOperator {
        let mut config = LoopConfig {
            model: "fake-model".into(),
            default_max_turns: max_turns,
            ..Default::default()
        };
        config.default_max_cost = max_cost;
        ReactOperator::new(
            Arc::new(FakeAdapter),
            Arc::new(transport),
            tools,
            Arc::new(hooks),
            Arc::new(NoCompaction),
            config,
        )
    }

    #[tokio::test]
    async fn simple_completion_exits_complete() {
        let op = make_operator(
            ScriptedTransport::new(simple_completion_script("hello there")),
            Arc::new(NoTools),
            HookRegistry::new(),
            10,
            None,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let output = op.execute(input).await.unwrap();
        assert_eq!(output.exit_reason, ExitReason::Complete);
        assert_eq!(output.message.text(), "hello there");
        assert_eq!(output.metadata.turns_used, 1);
        assert_eq!(output.metadata.tokens_in, 10);
        assert_eq!(output.metadata.tokens_out, 5);
    }

    struct EchoExecutor;

    impl ToolExecutor for EchoExecutor {
        fn tool_specs(&self) -> Vec<flo_provider::request::ToolSpec> {
            vec![flo_provider::request::ToolSpec::new(
                "echo",
                "echoes its input",
                serde_json::json!({"type": "object"}),
            )]
        }

        fn call<'a>(
            &'a self,
            name: &'a str,
            input: Value,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<Value, flo_tool::ToolError>> + Send + 'a>,
        > {
            let name = name.to_string();
            Box::pin(async move {
                if name == "echo" {
                    Ok(input)
                } else {
                    Err(flo_tool::ToolError::NotFound(name))
                }
            })
        }
    }

    #[tokio::test]
    async fn tool_use_then_completion_runs_two_turns() {
        let script = vec![
            tool_use_event("t-1", "echo", serde_json::json!({"msg": "hi"})),
            usage_event(10, 5),
            turn_end_event(true),
            text_event("done"),
            usage_event(8, 3),
            turn_end_event(false),
        ];
        let op = make_operator(
            ScriptedTransport::new(script),
            Arc::new(EchoExecutor),
            HookRegistry::new(),
            10,
            None,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let output = op.execute(input).await.unwrap();
        assert_eq!(output.exit_reason, ExitReason::Complete);
        assert_eq!(output.metadata.turns_used, 2);
        assert_eq!(output.metadata.tools_called.len(), 1);
        assert!(output.metadata.tools_called[0].success);
    }

    #[tokio::test]
    async fn unknown_tool_produces_error_result_and_continues() {
        let script = vec![
            tool_use_event("t-1", "mystery", Value::Null),
            usage_event(1, 1),
            turn_end_event(true),
            text_event("recovered"),
            usage_event(1, 1),
            turn_end_event(false),
        ];
        let op = make_operator(
            ScriptedTransport::new(script),
            Arc::new(NoTools),
            HookRegistry::new(),
            10,
            None,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let output = op.execute(input).await.unwrap();
        assert_eq!(output.exit_reason, ExitReason::Complete);
        assert!(!output.metadata.tools_called[0].success);
    }

    #[tokio::test]
    async fn max_turns_enforced() {
        let script = vec![
            tool_use_event("t-1", "echo", Value::Null),
            usage_event(1, 1),
            turn_end_event(true),
            tool_use_event("t-2", "echo", Value::Null),
            usage_event(1, 1),
            turn_end_event(true),
        ];
        let op = make_operator(
            ScriptedTransport::new(script),
            Arc::new(EchoExecutor),
            HookRegistry::new(),
            2,
            None,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let output = op.execute(input).await.unwrap();
        assert_eq!(output.exit_reason, ExitReason::MaxTurns);
        assert_eq!(output.metadata.turns_used, 2);
    }

    #[tokio::test]
    async fn budget_exhausted_stops_before_next_turn() {
        static MODELS: &[ModelInfo] = &[ModelInfo {
            id: "priced-model",
            display_name: "Priced",
            context_window: 100_000,
            max_output_tokens: 4096,
            pricing: Pricing::per_million(Decimal::new(100, 2), Decimal::new(100, 2)),
        }];

        struct PricedAdapter;
        impl ProviderAdapter for PricedAdapter {
            fn provider_name(&self) -> &'static str {
                "priced"
            }
            fn build_request(
                &self,
                _messages: &[Message],
                _tools: &[flo_provider::request::ToolSpec],
                _config: &RequestConfig,
            ) -> Result<HttpRequestSpec, ProviderError> {
                Ok(HttpRequestSpec::streaming("/api/priced/v1/messages", Value::Null))
            }
            fn new_stream_parser(&self) -> Box<dyn StreamParser> {
                Box::new(FakeParser)
            }
            fn extract_usage(&self, _final_body: &Value) -> Result<TokenUsage, ProviderError> {
                Ok(TokenUsage::default())
            }
            fn estimate_cost(&self, _model: &str, usage: &TokenUsage) -> CostEstimate {
                MODELS[0].pricing.estimate(usage)
            }
            fn models(&self) -> &'static [ModelInfo] {
                MODELS
            }
        }

        let script = vec![
            tool_use_event("t-1", "echo", Value::Null),
            usage_event(1_000_000, 0),
            turn_end_event(true),
        ];
        let transport = ScriptedTransport::new(script);
        let mut config = LoopConfig {
            model: "priced-model".into(),
            default_max_turns: 20,
            ..Default::default()
        };
        config.default_max_cost = Some(Decimal::new(50, 2));
        let op = ReactOperator::new(
            Arc::new(PricedAdapter),
            Arc::new(transport),
            Arc::new(EchoExecutor),
            Arc::new(HookRegistry::new()),
            Arc::new(NoCompaction),
            config,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let output = op.execute(input).await.unwrap();
        assert_eq!(output.exit_reason, ExitReason::BudgetExhausted);
        assert_eq!(output.metadata.turns_used, 1);
    }

    #[tokio::test]
    async fn stream_error_surfaces_as_model_error() {
        let script = vec![Err(ProviderError::Provider("boom".into()))];
        let op = make_operator(
            ScriptedTransport::new(script),
            Arc::new(NoTools),
            HookRegistry::new(),
            10,
            None,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let err = op.execute(input).await.unwrap_err();
        match err {
            OperatorError::Model(msg) => assert!(msg.contains("boom")),
            other => panic!("expected Model error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limited_stream_error_is_retryable() {
        let script = vec![Err(ProviderError::RateLimited)];
        let op = make_operator(
            ScriptedTransport::new(script),
            Arc::new(NoTools),
            HookRegistry::new(),
            10,
            None,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let err = op.execute(input).await.unwrap_err();
        assert!(matches!(err, OperatorError::Retryable(_)));
    }

    #[tokio::test]
    async fn stream_ending_without_turn_end_is_a_model_error() {
        let script = vec![text_event("partial")];
        let op = make_operator(
            ScriptedTransport::new(script),
            Arc::new(NoTools),
            HookRegistry::new(),
            10,
            None,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let err = op.execute(input).await.unwrap_err();
        assert!(matches!(err, OperatorError::Model(_)));
    }

    struct DenyEverythingHook;

    #[async_trait]
    impl flo_core::hook::Hook for DenyEverythingHook {
        fn points(&self) -> &[HookPoint] {
            &[HookPoint::PreToolUse]
        }
        async fn on_event(
            &self,
            _ctx: &HookContext,
        ) -> Result<HookAction, flo_core::hook::HookError> {
            Ok(HookAction::Deny {
                reason: "blocked by policy".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn pre_tool_use_deny_produces_synthetic_error_and_continues() {
        let script = vec![
            tool_use_event("t-1", "echo", Value::Null),
            usage_event(1, 1),
            turn_end_event(true),
            text_event("done anyway"),
            usage_event(1, 1),
            turn_end_event(false),
        ];
        let mut hooks = HookRegistry::new();
        hooks.add(Arc::new(DenyEverythingHook));
        let op = make_operator(
            ScriptedTransport::new(script),
            Arc::new(EchoExecutor),
            hooks,
            10,
            None,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let output = op.execute(input).await.unwrap();
        assert_eq!(output.exit_reason, ExitReason::Complete);
        assert!(!output.metadata.tools_called[0].success);
    }

    struct DenyAtStopHook(AtomicUsize);

    #[async_trait]
    impl flo_core::hook::Hook for DenyAtStopHook {
        fn points(&self) -> &[HookPoint] {
            &[HookPoint::Stop]
        }
        async fn on_event(
            &self,
            _ctx: &HookContext,
        ) -> Result<HookAction, flo_core::hook::HookError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(HookAction::Deny {
                reason: "observer halted the run".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn stop_hook_deny_overrides_exit_reason() {
        let mut hooks = HookRegistry::new();
        hooks.add(Arc::new(DenyAtStopHook(AtomicUsize::new(0))));
        let op = make_operator(
            ScriptedTransport::new(simple_completion_script("hi")),
            Arc::new(NoTools),
            hooks,
            10,
            None,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let output = op.execute(input).await.unwrap();
        match output.exit_reason {
            ExitReason::ObserverHalt { reason } => assert_eq!(reason, "observer halted the run"),
            other => panic!("expected ObserverHalt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn effect_tool_write_memory_is_recorded_and_run_continues() {
        let script = vec![
            tool_use_event(
                "t-1",
                "write_memory",
                serde_json::json!({"scope": "global", "key": "k", "value": 1}),
            ),
            usage_event(1, 1),
            turn_end_event(true),
            text_event("done"),
            usage_event(1, 1),
            turn_end_event(false),
        ];
        let op = make_operator(
            ScriptedTransport::new(script),
            Arc::new(NoTools),
            HookRegistry::new(),
            10,
            None,
        );
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let output = op.execute(input).await.unwrap();
        assert_eq!(output.effects.len(), 1);
        match &output.effects[0] {
            Effect::WriteMemory { key, .. } => assert_eq!(key, "k"),
            other => panic!("expected WriteMemory, got {other:?}"),
        }
    }
}
