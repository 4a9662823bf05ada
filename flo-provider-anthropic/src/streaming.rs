//! SSE streaming support for the Anthropic Messages API.
//!
//! Reference: <https://docs.anthropic.com/en/api/messages-streaming>

use std::collections::HashMap;

use flo_provider::{RawStreamEvent, StreamEvent, StreamParser, TokenUsage};

/// Tracks in-progress streaming state across SSE events.
pub struct AnthropicStreamParser {
    /// Map from block index to in-progress tool use (id, name, input_json_buf).
    tool_uses: HashMap<usize, ToolUseInProgress>,
    /// Whether any tool_use block has appeared this stream.
    saw_tool_use: bool,
    /// Whether we've already emitted a terminal event (TurnEnd/Error).
    done: bool,
}

struct ToolUseInProgress {
    id: String,
    name: String,
    input_buf: String,
}

impl Default for AnthropicStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AnthropicStreamParser {
    /// Build a fresh parser for one stream.
    pub fn new() -> Self {
        Self {
            tool_uses: HashMap::new(),
            saw_tool_use: false,
            done: false,
        }
    }

    fn dispatch(&mut self, event_type: &str, data: &str) -> Vec<StreamEvent> {
        if data == "[DONE]" || data.is_empty() {
            return vec![];
        }

        let json: serde_json::Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                self.done = true;
                return vec![StreamEvent::Error(format!("JSON parse error in SSE: {e}"))];
            }
        };

        match event_type {
            "content_block_start" => self.handle_content_block_start(&json),
            "content_block_delta" => self.handle_content_block_delta(&json),
            "content_block_stop" => self.handle_content_block_stop(&json),
            "message_delta" => self.handle_message_delta(&json),
            "message_stop" => {
                self.done = true;
                vec![StreamEvent::TurnEnd {
                    has_tool_use: self.saw_tool_use,
                }]
            }
            "message_start" | "ping" => vec![],
            "error" => {
                self.done = true;
                let msg = json["error"]["message"]
                    .as_str()
                    .unwrap_or("unknown streaming error")
                    .to_string();
                vec![StreamEvent::Error(msg)]
            }
            _ => vec![],
        }
    }

    fn handle_content_block_start(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let block = &json["content_block"];
        let block_type = block["type"].as_str().unwrap_or("");

        match block_type {
            "tool_use" => {
                let id = block["id"].as_str().unwrap_or("").to_string();
                let name = block["name"].as_str().unwrap_or("").to_string();
                self.saw_tool_use = true;
                self.tool_uses.insert(
                    index,
                    ToolUseInProgress {
                        id: id.clone(),
                        name: name.clone(),
                        input_buf: String::new(),
                    },
                );
                vec![StreamEvent::ToolUseStart { id, name }]
            }
            _ => vec![],
        }
    }

    fn handle_content_block_delta(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let delta = &json["delta"];
        let delta_type = delta["type"].as_str().unwrap_or("");

        match delta_type {
            "text_delta" => {
                let text = delta["text"].as_str().unwrap_or("").to_string();
                vec![StreamEvent::TextDelta(text)]
            }
            "input_json_delta" => {
                let partial = delta["partial_json"].as_str().unwrap_or("").to_string();
                let id = self
                    .tool_uses
                    .get_mut(&index)
                    .map(|t| {
                        t.input_buf.push_str(&partial);
                        t.id.clone()
                    })
                    .unwrap_or_default();
                vec![StreamEvent::ToolUseInputDelta { id, delta: partial }]
            }
            _ => vec![],
        }
    }

    fn handle_content_block_stop(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        if let Some(tool) = self.tool_uses.remove(&index) {
            let input = serde_json::from_str(&tool.input_buf).unwrap_or(serde_json::Value::Null);
            vec![StreamEvent::ToolUseDone {
                id: tool.id,
                name: tool.name,
                input,
            }]
        } else {
            vec![]
        }
    }

    fn handle_message_delta(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let Some(usage_val) = json.get("usage") else {
            return vec![];
        };
        let usage = TokenUsage {
            input_tokens: usage_val["input_tokens"].as_u64().unwrap_or(0),
            output_tokens: usage_val["output_tokens"].as_u64().unwrap_or(0),
            cache_read_tokens: usage_val["cache_read_input_tokens"].as_u64(),
            cache_creation_tokens: usage_val["cache_creation_input_tokens"].as_u64(),
        };
        vec![StreamEvent::Usage(usage)]
    }
}

impl StreamParser for AnthropicStreamParser {
    fn feed(&mut self, event: &RawStreamEvent) -> Vec<StreamEvent> {
        let Some(event_type) = event.event_type.as_deref() else {
            return vec![];
        };
        self.dispatch(event_type, &event.data)
    }

    fn finish(&mut self) -> Vec<StreamEvent> {
        if self.done {
            vec![]
        } else {
            self.done = true;
            vec![StreamEvent::TurnEnd {
                has_tool_use: self.saw_tool_use,
            }]
        }
    }
}

/// Join raw SSE lines (`event: ...` / `data: ...`, blank line terminated) into
/// the sequence of `RawStreamEvent`s a [`StreamParser`] expects. The relay's
/// HTTP transport owns byte-chunk buffering; this only groups already-split
/// lines.
pub fn events_from_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<RawStreamEvent> {
    let mut out = Vec::new();
    let mut event_type: Option<String> = None;
    let mut data = String::new();

    for line in lines {
        if line.is_empty() {
            if let Some(ty) = event_type.take() {
                out.push(RawStreamEvent::sse(ty, std::mem::take(&mut data)));
            } else {
                data.clear();
            }
            continue;
        }
        if let Some(ty) = line.strip_prefix("event: ") {
            event_type = Some(ty.trim().to_string());
        } else if let Some(d) = line.strip_prefix("data: ") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(d.trim());
        }
    }

    out
}
