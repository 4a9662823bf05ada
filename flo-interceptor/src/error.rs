//! Errors from interceptor configuration and request routing.

use flo_core::error::{ErrorKind, FloError};
use thiserror::Error;

/// Errors from configuring or routing through the interceptor.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InterceptorError {
    /// A `configure_*` message carried invalid input (e.g. a non-http(s) hub URL).
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A `configure_*` message did not originate from the primary-document source.
    #[error("configuration rejected: {0} did not originate from the primary document")]
    UntrustedSource(&'static str),
    /// No credential is configured for the requested provider.
    #[error("no {0} API key configured")]
    MissingCredential(String),
    /// The underlying HTTP transport failed (connection refused, TLS, DNS).
    #[error("network error: {0}")]
    Network(String),
    /// The upstream provider returned a non-2xx response (body passed through unchanged).
    #[error("provider error: {status}")]
    Provider {
        /// Upstream HTTP status code.
        status: u16,
        /// Upstream response body, passed through verbatim.
        body: String,
    },
}

impl InterceptorError {
    /// The stable error-kind tag this maps onto, per the unified taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            InterceptorError::Config(_) => "config",
            InterceptorError::UntrustedSource(_) => "policy",
            InterceptorError::MissingCredential(_) => "auth",
            InterceptorError::Network(_) => "network",
            InterceptorError::Provider { .. } => "provider",
        }
    }
}

impl From<InterceptorError> for FloError {
    fn from(err: InterceptorError) -> Self {
        let kind = match err.kind() {
            "config" => ErrorKind::Config,
            "policy" => ErrorKind::Policy,
            "auth" => ErrorKind::Auth,
            "network" => ErrorKind::Network,
            _ => ErrorKind::Provider,
        };
        let remedy = if let InterceptorError::MissingCredential(provider) = &err {
            Some(FloError::missing_api_key(provider).remedy().unwrap_or_default().to_string())
        } else {
            None
        };
        let mut out = FloError::new(kind, err.to_string());
        if let Some(remedy) = remedy {
            out = out.with_remedy(remedy);
        }
        out
    }
}
