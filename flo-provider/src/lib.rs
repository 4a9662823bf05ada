//! Provider adapter contract.
//!
//! This crate defines the canonical shapes that sit between `flo-loop` and
//! the concrete provider crates (`flo-provider-anthropic`,
//! `flo-provider-openai`, `flo-provider-ollama`). It owns no HTTP client and
//! no provider-specific wire format; it only names the seam.

pub mod adapter;
pub mod request;
pub mod usage;

pub use adapter::{ProviderAdapter, ProviderError, RawStreamEvent, StreamEvent, StreamParser};
pub use request::{HttpRequestSpec, RequestConfig, ToolSpec};
pub use usage::{CostEstimate, ModelInfo, Pricing, TokenUsage};
