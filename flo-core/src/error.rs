//! The unified error taxonomy.
//!
//! Every layer has its own crate-local error type (`ProviderError`,
//! `ToolError`, `RelayError`, ...) for precise `match`ing close to where the
//! error originates. Each converts into [`FloError`] via `#[from]` so call
//! sites that only need the coarse kind — for telemetry, or for surfacing a
//! one-sentence message to a user — don't need to know every leaf type.

use thiserror::Error;

/// One of the ten error kinds every user- or telemetry-facing surface reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Invalid configuration input.
    Config,
    /// Missing or invalid credential.
    Auth,
    /// Upstream unreachable.
    Network,
    /// Upstream returned an HTTP error.
    Provider,
    /// Malformed stream or response body.
    Parse,
    /// A correlated request expired.
    Timeout,
    /// Explicit cancellation or supervisor shutdown.
    Cancelled,
    /// Token or cost budget exceeded.
    Budget,
    /// Hook denial or network-policy denial.
    Policy,
    /// Programmer error — should not happen in a correct build.
    Internal,
}

impl ErrorKind {
    /// Stable telemetry tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Auth => "auth",
            ErrorKind::Network => "network",
            ErrorKind::Provider => "provider",
            ErrorKind::Parse => "parse",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Budget => "budget",
            ErrorKind::Policy => "policy",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified error type for the fabric.
///
/// Carries a kind, a message, and an optional user-facing remedial hint
/// ("No Anthropic API key configured. Open Settings and add your API key...").
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
#[non_exhaustive]
pub struct FloError {
    /// The error kind.
    pub kind: ErrorKind,
    /// A developer-facing message.
    pub message: String,
    /// A user-facing one-sentence remedial hint, if one is known.
    pub remedy: Option<String>,
}

impl FloError {
    /// Build a new error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            remedy: None,
        }
    }

    /// Attach a remedial hint.
    pub fn with_remedy(mut self, remedy: impl Into<String>) -> Self {
        self.remedy = Some(remedy.into());
        self
    }

    /// The stable telemetry tag for this error's kind.
    pub fn kind(&self) -> &'static str {
        self.kind.as_str()
    }

    /// The user-facing remedial hint, if any.
    pub fn remedy(&self) -> Option<&str> {
        self.remedy.as_deref()
    }

    /// Build the standard "missing API key" auth error for a provider.
    pub fn missing_api_key(provider: &str) -> Self {
        Self::new(
            ErrorKind::Auth,
            format!("no {provider} API key configured"),
        )
        .with_remedy(format!(
            "No {provider} API key configured. Open Settings and add your API key, or connect to a hub with shared keys."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_as_str_uses_stable_telemetry_tags() {
        assert_eq!(ErrorKind::Config.as_str(), "config");
        assert_eq!(ErrorKind::Policy.as_str(), "policy");
        assert_eq!(ErrorKind::Internal.as_str(), "internal");
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = FloError::new(ErrorKind::Timeout, "tool_call t-1 expired");
        assert_eq!(err.to_string(), "timeout: tool_call t-1 expired");
    }

    #[test]
    fn missing_api_key_names_the_provider_in_the_remedy() {
        let err = FloError::missing_api_key("Anthropic");
        assert_eq!(err.kind(), "auth");
        assert!(err.remedy().unwrap().contains("Anthropic"));
        assert!(err.remedy().unwrap().contains("Settings"));
    }

    #[test]
    fn no_remedy_by_default() {
        let err = FloError::new(ErrorKind::Internal, "unreachable");
        assert!(err.remedy().is_none());
    }
}
