//! The canonical, provider-independent message model.
//!
//! Every provider adapter translates to and from this shape; nothing above
//! the adapter boundary ever sees a provider-specific wire format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A human or upstream caller.
    User,
    /// The model.
    Assistant,
}

/// One block of message content, in the order the model (or caller) produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text itself.
        text: String,
    },
    /// A tool invocation the model requested.
    ToolUse {
        /// Correlation id for the matching `ToolResult`.
        id: String,
        /// Tool name as registered in the tool registry.
        name: String,
        /// Tool input, already fully assembled (no partial JSON here).
        input: Value,
    },
    /// The result of executing a previously emitted `ToolUse` block.
    ToolResult {
        /// The `ToolUse::id` this result answers.
        tool_use_id: String,
        /// Result content, already rendered to a string for the model to read.
        content: String,
        /// Whether the tool execution failed.
        is_error: bool,
    },
}

impl ContentBlock {
    /// Build a text block.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Build an error tool-result block (used for hook denials, timeouts, and cancellations).
    pub fn tool_error(tool_use_id: impl Into<String>, message: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: message.into(),
            is_error: true,
        }
    }

    /// `Some(text)` if this block is plain text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A single message in the canonical conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this message.
    pub role: Role,
    /// The ordered content blocks.
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Build a single-text-block user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Build a single-text-block assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Concatenate every text block's content, ignoring tool blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// `true` if this message carries at least one `ToolUse` block.
    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_text_roundtrip() {
        let m = Message::user("hello");
        assert_eq!(m.role, Role::User);
        assert_eq!(m.text(), "hello");
    }

    #[test]
    fn has_tool_use_detects_tool_blocks() {
        let mut m = Message::assistant("thinking");
        assert!(!m.has_tool_use());
        m.content.push(ContentBlock::ToolUse {
            id: "t-1".into(),
            name: "search".into(),
            input: serde_json::json!({"q": "rust"}),
        });
        assert!(m.has_tool_use());
    }

    #[test]
    fn tool_error_sets_is_error() {
        let block = ContentBlock::tool_error("t-1", "denied by hook");
        match block {
            ContentBlock::ToolResult { is_error, content, .. } => {
                assert!(is_error);
                assert_eq!(content, "denied by hook");
            }
            _ => panic!("expected ToolResult"),
        }
    }

    #[test]
    fn content_block_serde_tag_is_type() {
        let block = ContentBlock::text("hi");
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hi");
    }
}
