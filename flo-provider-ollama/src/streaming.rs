//! NDJSON streaming support for Ollama's `/api/chat` endpoint.
//!
//! Unlike Anthropic's SSE format, Ollama emits one complete JSON object per
//! line:
//! ```text
//! {"model":"llama3.2","message":{"role":"assistant","content":"Hello"},"done":false}
//! {"model":"llama3.2","message":{"role":"assistant","content":""},"done":true,"eval_count":10,"prompt_eval_count":20}
//! ```
//!
//! Reference: <https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion>

use flo_provider::{RawStreamEvent, StreamEvent, StreamParser, TokenUsage};

/// NDJSON line-at-a-time parser for Ollama's chat stream.
#[derive(Default)]
pub struct OllamaStreamParser {
    saw_tool_use: bool,
    done: bool,
}

impl OllamaStreamParser {
    /// Build a fresh parser for one stream.
    pub fn new() -> Self {
        Self::default()
    }

    fn process_line(&mut self, line: &str) -> Vec<StreamEvent> {
        let json: serde_json::Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                self.done = true;
                return vec![StreamEvent::Error(format!("JSON parse error in NDJSON: {e}"))];
            }
        };

        let mut events = Vec::new();

        let content = json["message"]["content"].as_str().unwrap_or_default();
        if !content.is_empty() {
            events.push(StreamEvent::TextDelta(content.to_string()));
        }

        if let Some(tool_calls) = json["message"]["tool_calls"].as_array() {
            for tc in tool_calls {
                let function = &tc["function"];
                let name = function["name"].as_str().unwrap_or_default().to_string();
                let input = function["arguments"].clone();
                let id = format!("ollama_{}", uuid::Uuid::new_v4());
                self.saw_tool_use = true;

                events.push(StreamEvent::ToolUseStart {
                    id: id.clone(),
                    name: name.clone(),
                });
                events.push(StreamEvent::ToolUseInputDelta {
                    id: id.clone(),
                    delta: input.to_string(),
                });
                events.push(StreamEvent::ToolUseDone { id, name, input });
            }
        }

        let done = json["done"].as_bool().unwrap_or(false);
        if done {
            self.done = true;
            events.push(StreamEvent::Usage(TokenUsage {
                input_tokens: json["prompt_eval_count"].as_u64().unwrap_or(0),
                output_tokens: json["eval_count"].as_u64().unwrap_or(0),
                cache_read_tokens: None,
                cache_creation_tokens: None,
            }));
            events.push(StreamEvent::TurnEnd {
                has_tool_use: self.saw_tool_use,
            });
        }

        events
    }
}

impl StreamParser for OllamaStreamParser {
    fn feed(&mut self, event: &RawStreamEvent) -> Vec<StreamEvent> {
        if event.data.trim().is_empty() {
            return vec![];
        }
        self.process_line(&event.data)
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

/// Wrap each non-blank NDJSON line as a [`RawStreamEvent`].
pub fn events_from_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<RawStreamEvent> {
    lines
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(RawStreamEvent::line)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut OllamaStreamParser, text: &str) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for raw in events_from_lines(text.lines()) {
            events.extend(parser.feed(&raw));
        }
        events
    }

    #[test]
    fn parse_text_deltas() {
        let mut parser = OllamaStreamParser::new();
        let lines = "\
{\"model\":\"llama3.2\",\"message\":{\"role\":\"assistant\",\"content\":\"Hello\"},\"done\":false}
{\"model\":\"llama3.2\",\"message\":{\"role\":\"assistant\",\"content\":\" world\"},\"done\":false}
";
        let events = feed(&mut parser, lines);
        let texts: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::TextDelta(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Hello", " world"]);
    }

    #[test]
    fn done_line_emits_usage_and_turn_end() {
        let mut parser = OllamaStreamParser::new();
        let line = "{\"model\":\"llama3.2\",\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true,\"eval_count\":10,\"prompt_eval_count\":20}";
        let events = feed(&mut parser, line);
        assert!(events.iter().any(|e| matches!(e, StreamEvent::Usage(u) if u.input_tokens == 20 && u.output_tokens == 10)));
        assert!(events.iter().any(|e| matches!(e, StreamEvent::TurnEnd { has_tool_use: false })));
    }

    #[test]
    fn tool_call_is_fully_assembled_in_one_line() {
        let mut parser = OllamaStreamParser::new();
        let line = r#"{"model":"llama3.2","message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"search","arguments":{"q":"rust"}}}]},"done":false}"#;
        let events = feed(&mut parser, line);
        assert!(events.iter().any(|e| matches!(e, StreamEvent::ToolUseStart { name, .. } if name == "search")));
        assert!(events.iter().any(|e| matches!(
            e,
            StreamEvent::ToolUseDone { name, input, .. } if name == "search" && input["q"] == "rust"
        )));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut parser = OllamaStreamParser::new();
        let events = feed(&mut parser, "\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn stream_ending_without_done_synthesizes_turn_end() {
        let mut parser = OllamaStreamParser::new();
        let _ = feed(&mut parser, "{\"message\":{\"content\":\"hi\"},\"done\":false}");
        let events = parser.finish();
        assert!(events.iter().any(|e| matches!(e, StreamEvent::TurnEnd { has_tool_use: false })));
    }
}
