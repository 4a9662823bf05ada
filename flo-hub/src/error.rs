//! Hub connection and routing errors.

use flo_core::error::{ErrorKind, FloError};
use thiserror::Error;

/// Errors from a hub connection or a routed hub operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HubError {
    /// The underlying transport failed to connect or dropped mid-session.
    #[error("hub connection error: {0}")]
    Connection(String),
    /// The hub connection is not currently established.
    #[error("hub not connected")]
    Disconnected,
    /// A correlated hub request expired before a response arrived.
    #[error("hub request timed out")]
    Timeout,
    /// A correlated hub request was cancelled (disconnection, explicit cancel).
    #[error("hub request cancelled")]
    Cancelled,
    /// The requested tool is not in the hub's last-announced capability set.
    #[error("tool {0} is not routable to the hub")]
    ToolNotRoutable(String),
    /// A frame could not be parsed as valid wire protocol.
    #[error("malformed hub frame: {0}")]
    Protocol(String),
    /// The hub rejected the auth token.
    #[error("hub auth failed: {0}")]
    AuthFailed(String),
}

impl HubError {
    /// The stable error-kind tag this maps onto, per the unified taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            HubError::Connection(_) => "network",
            HubError::Disconnected => "network",
            HubError::Timeout => "timeout",
            HubError::Cancelled => "cancelled",
            HubError::ToolNotRoutable(_) => "policy",
            HubError::Protocol(_) => "parse",
            HubError::AuthFailed(_) => "auth",
        }
    }
}

impl From<HubError> for FloError {
    fn from(err: HubError) -> Self {
        let kind = match err.kind() {
            "network" => ErrorKind::Network,
            "timeout" => ErrorKind::Timeout,
            "cancelled" => ErrorKind::Cancelled,
            "policy" => ErrorKind::Policy,
            "parse" => ErrorKind::Parse,
            _ => ErrorKind::Auth,
        };
        FloError::new(kind, err.to_string())
    }
}
