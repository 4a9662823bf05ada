#![deny(missing_docs)]
//! # flo — umbrella crate
//!
//! A single import surface for the flo multi-agent execution fabric.
//! Re-exports protocol and key implementations behind feature flags, plus
//! a [`prelude`] for the happy path.

#[cfg(feature = "core")]
pub use flo_core;
#[cfg(feature = "agent-loop")]
pub use flo_loop;
#[cfg(feature = "hooks")]
pub use flo_hooks;
#[cfg(feature = "hub")]
pub use flo_hub;
#[cfg(feature = "interceptor")]
pub use flo_interceptor;
#[cfg(feature = "provider")]
pub use flo_provider;
#[cfg(feature = "provider-anthropic")]
pub use flo_provider_anthropic;
#[cfg(feature = "provider-ollama")]
pub use flo_provider_ollama;
#[cfg(feature = "provider-openai")]
pub use flo_provider_openai;
#[cfg(feature = "relay")]
pub use flo_relay;
#[cfg(feature = "state-memory")]
pub use flo_state_memory;
#[cfg(feature = "supervisor")]
pub use flo_supervisor;
#[cfg(feature = "tool")]
pub use flo_tool;

/// Happy-path imports for composing flo systems.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use flo_core::{
        AgentEvent, AgentId, ContentBlock, DurationMs, Effect, ErrorKind, ExitReason, FloError,
        Hook, HookAction, HookContext, HookPoint, HubConnectionId, Message, Operator,
        OperatorConfig, OperatorInput, OperatorOutput, Relay, Role, SandboxEnvironment, Scope,
        StateReader, StateStore, SubworkerId, WorkerId, WorkflowId,
    };

    #[cfg(feature = "hooks")]
    pub use flo_hooks::HookRegistry;

    #[cfg(feature = "relay")]
    pub use flo_relay::{CapabilityRouter, InProcessRelay};

    #[cfg(feature = "tool")]
    pub use flo_tool::{DispatchSite, ToolDyn, ToolError, ToolRegistry};

    #[cfg(feature = "provider")]
    pub use flo_provider::{ProviderAdapter, ProviderError};

    #[cfg(feature = "agent-loop")]
    pub use flo_loop::{LoopConfig, ReactOperator};

    #[cfg(feature = "provider-anthropic")]
    pub use flo_provider_anthropic::AnthropicAdapter;

    #[cfg(feature = "provider-openai")]
    pub use flo_provider_openai::OpenAiAdapter;

    #[cfg(feature = "provider-ollama")]
    pub use flo_provider_ollama::OllamaAdapter;

    #[cfg(feature = "state-memory")]
    pub use flo_state_memory::MemoryStore;

    #[cfg(feature = "interceptor")]
    pub use flo_interceptor::InterceptingTransport;

    #[cfg(feature = "hub")]
    pub use flo_hub::{HubLink, HubTransport, WebSocketTransport};

    #[cfg(feature = "supervisor")]
    pub use flo_supervisor::{AgentConfig, AgentManager, AgentSupervisor};
}
