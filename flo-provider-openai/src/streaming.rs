//! SSE streaming support for OpenAI's Chat Completions API.
//!
//! Reference: <https://platform.openai.com/docs/api-reference/chat-streaming>

use std::collections::BTreeMap;

use flo_provider::{RawStreamEvent, StreamEvent, StreamParser, TokenUsage};

struct ToolCallInProgress {
    id: String,
    name: String,
    arguments_buf: String,
    started: bool,
}

/// Tracks in-progress streaming state across `chat.completion.chunk` events.
///
/// OpenAI keys tool call deltas by `tool_calls[].index`, a choice-scoped
/// index distinct from any content-block index; accumulate per index until
/// `finish_reason` closes the choice.
pub struct OpenAiStreamParser {
    tool_calls: BTreeMap<u64, ToolCallInProgress>,
    done: bool,
}

impl Default for OpenAiStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiStreamParser {
    /// Build a fresh parser for one stream.
    pub fn new() -> Self {
        Self {
            tool_calls: BTreeMap::new(),
            done: false,
        }
    }

    fn finish_all_tool_calls(&mut self) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        for (_, call) in std::mem::take(&mut self.tool_calls) {
            if !call.started {
                continue;
            }
            let input = serde_json::from_str(&call.arguments_buf).unwrap_or(serde_json::Value::Null);
            out.push(StreamEvent::ToolUseDone {
                id: call.id,
                name: call.name,
                input,
            });
        }
        out
    }

    fn handle_chunk(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let mut out = Vec::new();

        if let Some(usage_val) = json.get("usage").filter(|u| !u.is_null()) {
            out.push(StreamEvent::Usage(TokenUsage {
                input_tokens: usage_val["prompt_tokens"].as_u64().unwrap_or(0),
                output_tokens: usage_val["completion_tokens"].as_u64().unwrap_or(0),
                cache_read_tokens: usage_val["prompt_tokens_details"]["cached_tokens"].as_u64(),
                cache_creation_tokens: None,
            }));
        }

        let Some(choice) = json["choices"].get(0) else {
            return out;
        };
        let delta = &choice["delta"];

        if let Some(text) = delta["content"].as_str() {
            if !text.is_empty() {
                out.push(StreamEvent::TextDelta(text.to_string()));
            }
        }

        if let Some(tool_calls) = delta["tool_calls"].as_array() {
            for tc in tool_calls {
                let Some(index) = tc["index"].as_u64() else {
                    continue;
                };
                let entry = self.tool_calls.entry(index).or_insert_with(|| ToolCallInProgress {
                    id: String::new(),
                    name: String::new(),
                    arguments_buf: String::new(),
                    started: false,
                });

                if let Some(id) = tc["id"].as_str() {
                    entry.id = id.to_string();
                }
                if let Some(name) = tc["function"]["name"].as_str() {
                    entry.name = name.to_string();
                }
                if !entry.started && !entry.id.is_empty() {
                    entry.started = true;
                    out.push(StreamEvent::ToolUseStart {
                        id: entry.id.clone(),
                        name: entry.name.clone(),
                    });
                }
                if let Some(args) = tc["function"]["arguments"].as_str() {
                    entry.arguments_buf.push_str(args);
                    out.push(StreamEvent::ToolUseInputDelta {
                        id: entry.id.clone(),
                        delta: args.to_string(),
                    });
                }
            }
        }

        if let Some(reason) = choice["finish_reason"].as_str() {
            out.extend(self.finish_all_tool_calls());
            self.done = true;
            out.push(StreamEvent::TurnEnd {
                has_tool_use: reason == "tool_calls",
            });
        }

        out
    }
}

impl StreamParser for OpenAiStreamParser {
    fn feed(&mut self, event: &RawStreamEvent) -> Vec<StreamEvent> {
        if event.data == "[DONE]" {
            return vec![];
        }
        let json: serde_json::Value = match serde_json::from_str(&event.data) {
            Ok(v) => v,
            Err(e) => {
                self.done = true;
                return vec![StreamEvent::Error(format!("JSON parse error in SSE: {e}"))];
            }
        };
        self.handle_chunk(&json)
    }

    fn finish(&mut self) -> Vec<StreamEvent> {
        if self.done {
            vec![]
        } else {
            self.done = true;
            let mut out = self.finish_all_tool_calls();
            out.push(StreamEvent::TurnEnd { has_tool_use: false });
            out
        }
    }
}

/// Join raw SSE `data: ...` lines (blank-line terminated) into the sequence
/// of `RawStreamEvent`s a [`StreamParser`] expects.
pub fn events_from_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<RawStreamEvent> {
    lines
        .filter_map(|line| line.strip_prefix("data: ").map(str::trim))
        .filter(|data| !data.is_empty())
        .map(RawStreamEvent::line)
        .collect()
}
