//! Context-window compaction strategy.
//!
//! Provider-native truncation (Anthropic's prompt caching, OpenAI's
//! `truncation: auto`) is invisible to a [`ContextStrategy`] — it lives
//! inside the adapter, not here. This trait only covers client-side
//! compaction: deciding, from the assembled message list alone, whether the
//! conversation needs trimming before it's handed to `build_request`.

use flo_core::content::{ContentBlock, Message};

/// Strategy for keeping an agent's conversation within its model's usable
/// context window.
///
/// Implementations: [`NoCompaction`] (passthrough — appropriate for short
/// conversations or providers that truncate server-side), [`SlidingWindow`]
/// (drop the oldest turns once a cap is crossed, preserving the first
/// message as standing task context).
pub trait ContextStrategy: Send + Sync {
    /// Estimate the token cost of a message list.
    fn token_estimate(&self, messages: &[Message]) -> usize;

    /// Whether compaction should run given the current messages and the
    /// model's configured limit.
    fn should_compact(&self, messages: &[Message], limit: usize) -> bool;

    /// Compact the message list. Returns a list no longer than the input.
    fn compact(&self, messages: Vec<Message>) -> Vec<Message>;

    /// A stable name for this strategy, surfaced on
    /// `CompactionEvent::CompactionComplete`.
    fn name(&self) -> &'static str;
}

fn block_len(block: &ContentBlock) -> usize {
    match block {
        ContentBlock::Text { text } => text.len(),
        ContentBlock::ToolUse { input, .. } => input.to_string().len(),
        ContentBlock::ToolResult { content, .. } => content.len(),
    }
}

/// Rough chars-per-token ratio used by the estimator below. Not exact — an
/// estimate is all `should_compact` needs to decide whether to run at all.
const CHARS_PER_TOKEN: usize = 4;

/// A no-op strategy that never compacts.
///
/// The right choice for short-lived conversations, and for providers whose
/// adapter already requests server-side truncation.
pub struct NoCompaction;

impl ContextStrategy for NoCompaction {
    fn token_estimate(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .flat_map(|m| &m.content)
            .map(|block| block_len(block) / CHARS_PER_TOKEN)
            .sum()
    }

    fn should_compact(&self, _messages: &[Message], _limit: usize) -> bool {
        false
    }

    fn compact(&self, messages: Vec<Message>) -> Vec<Message> {
        messages
    }

    fn name(&self) -> &'static str {
        "no_compaction"
    }
}

/// Drops the oldest messages once the estimated token count crosses the
/// limit, always preserving the first message (the run's original task) so
/// standing instructions never age out.
pub struct SlidingWindow {
    /// How many of the most recent messages to retain, not counting the
    /// preserved first message.
    pub keep_last: usize,
}

impl SlidingWindow {
    /// Build a sliding window retaining the given number of recent messages.
    pub fn new(keep_last: usize) -> Self {
        Self { keep_last }
    }
}

impl ContextStrategy for SlidingWindow {
    fn token_estimate(&self, messages: &[Message]) -> usize {
        NoCompaction.token_estimate(messages)
    }

    fn should_compact(&self, messages: &[Message], limit: usize) -> bool {
        self.token_estimate(messages) > limit
    }

    fn compact(&self, messages: Vec<Message>) -> Vec<Message> {
        if messages.len() <= self.keep_last + 1 {
            return messages;
        }
        let mut kept = Vec::with_capacity(self.keep_last + 1);
        kept.push(messages[0].clone());
        kept.extend(messages[messages.len() - self.keep_last..].iter().cloned());
        kept
    }

    fn name(&self) -> &'static str {
        "sliding_window"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flo_core::content::Role;

    fn msg(text: &str) -> Message {
        Message {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    #[test]
    fn no_compaction_never_compacts() {
        let strategy = NoCompaction;
        let messages = vec![msg("hello")];
        assert!(!strategy.should_compact(&messages, 0));
        let compacted = strategy.compact(messages.clone());
        assert_eq!(compacted.len(), messages.len());
    }

    #[test]
    fn no_compaction_estimates_by_chars_over_four() {
        let strategy = NoCompaction;
        let messages = vec![msg(&"a".repeat(400))];
        assert_eq!(strategy.token_estimate(&messages), 100);
    }

    #[test]
    fn sliding_window_keeps_first_and_most_recent() {
        let strategy = SlidingWindow::new(2);
        let messages: Vec<Message> = (0..5).map(|i| msg(&i.to_string())).collect();
        let compacted = strategy.compact(messages);
        assert_eq!(compacted.len(), 3);
        assert_eq!(compacted[0].content[0], ContentBlock::text("0"));
        assert_eq!(compacted[1].content[0], ContentBlock::text("3"));
        assert_eq!(compacted[2].content[0], ContentBlock::text("4"));
    }

    #[test]
    fn sliding_window_is_a_no_op_under_the_cap() {
        let strategy = SlidingWindow::new(10);
        let messages = vec![msg("a"), msg("b")];
        let compacted = strategy.compact(messages.clone());
        assert_eq!(compacted.len(), messages.len());
    }

    #[test]
    fn sliding_window_should_compact_past_the_limit() {
        let strategy = SlidingWindow::new(2);
        let messages = vec![msg(&"a".repeat(400))];
        assert!(strategy.should_compact(&messages, 10));
        assert!(!strategy.should_compact(&messages, 1000));
    }
}
