//! Usage accounting and cost estimation shapes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Token usage reported for one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens consumed.
    pub input_tokens: u64,
    /// Completion tokens consumed.
    pub output_tokens: u64,
    /// Tokens served from a prompt cache, if the provider reports them.
    pub cache_read_tokens: Option<u64>,
    /// Tokens written to a prompt cache, if the provider reports them.
    pub cache_creation_tokens: Option<u64>,
}

impl TokenUsage {
    /// Total tokens (input + output), ignoring cache accounting.
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A cost estimate for one turn, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostEstimate {
    /// Estimated USD cost.
    pub usd: Decimal,
}

impl CostEstimate {
    /// Build a new cost estimate.
    pub fn new(usd: Decimal) -> Self {
        Self { usd }
    }

    /// The zero-cost estimate (e.g. a local provider with no egress cost).
    pub fn zero() -> Self {
        Self { usd: Decimal::ZERO }
    }
}

/// Pricing for one model, expressed per million tokens (matching how every
/// provider publishes pricing today).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    /// USD per 1,000,000 input tokens.
    pub input_per_million: Decimal,
    /// USD per 1,000,000 output tokens.
    pub output_per_million: Decimal,
}

impl Pricing {
    /// Build pricing from per-million-token rates.
    pub const fn per_million(input: Decimal, output: Decimal) -> Self {
        Self {
            input_per_million: input,
            output_per_million: output,
        }
    }

    /// No cost at all (local/self-hosted models).
    pub const ZERO: Pricing = Pricing::per_million(Decimal::ZERO, Decimal::ZERO);

    /// Estimate the cost of a given usage under this pricing.
    pub fn estimate(&self, usage: &TokenUsage) -> CostEstimate {
        let million = Decimal::from(1_000_000u32);
        let input_cost = Decimal::from(usage.input_tokens) * self.input_per_million / million;
        let output_cost = Decimal::from(usage.output_tokens) * self.output_per_million / million;
        CostEstimate::new(input_cost + output_cost)
    }
}

/// A model registry entry: everything the loop and the budget accumulator
/// need to know about one concrete model, independent of any live request.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// The model id as passed on the wire (`"claude-haiku-4-5-20251001"`, ...).
    pub id: &'static str,
    /// Human-readable display name.
    pub display_name: &'static str,
    /// Total context window, in tokens.
    pub context_window: u32,
    /// Maximum output tokens the provider allows in one turn.
    pub max_output_tokens: u32,
    /// Pricing for this model. Callers may override per-model pricing.
    pub pricing: Pricing,
}
