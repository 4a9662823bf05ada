//! The HTTP-egress seam the loop drives a stream through.
//!
//! `flo-provider` deliberately owns no HTTP client — its adapters only
//! translate shapes. Something still has to actually issue the
//! [`HttpRequestSpec`] and hand back wire bytes; [`ApiTransport`] is that
//! seam. The concrete implementation (`flo-interceptor`, backed by
//! `reqwest`) injects credentials and rewrites the request's destination
//! before it ever reaches a socket — none of which this trait, or anything
//! above it, needs to know about.

use async_trait::async_trait;
use flo_provider::{HttpRequestSpec, ProviderError, RawStreamEvent};
use tokio::sync::mpsc;

/// Issues one HTTP request and streams back its raw wire events.
///
/// Implementations: `flo-interceptor::InterceptingTransport` (the real
/// `reqwest`-backed egress path), and in-memory fakes for testing the loop
/// without a live network.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Send `spec` and return a channel of raw events as they arrive.
    ///
    /// The channel closes when the underlying response body ends; the loop
    /// treats channel closure the same way [`flo_provider::StreamParser::finish`]
    /// expects — as "the transport ended", not as an error in itself. A
    /// transport-level failure (connection refused, TLS error, non-2xx
    /// status) is reported as a single `Err` item rather than a silently
    /// closed channel, so the loop can distinguish "no more events" from
    /// "something went wrong".
    async fn send(
        &self,
        spec: HttpRequestSpec,
    ) -> Result<mpsc::Receiver<Result<RawStreamEvent, ProviderError>>, ProviderError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// A transport that replays a fixed, pre-scripted sequence of raw
    /// events (or a single terminal error) regardless of the request sent.
    pub struct ScriptedTransport {
        events: Mutex<Option<Vec<Result<RawStreamEvent, ProviderError>>>>,
    }

    impl ScriptedTransport {
        pub fn new(events: Vec<Result<RawStreamEvent, ProviderError>>) -> Self {
            Self {
                events: Mutex::new(Some(events)),
            }
        }
    }

    #[async_trait]
    impl ApiTransport for ScriptedTransport {
        async fn send(
            &self,
            _spec: HttpRequestSpec,
        ) -> Result<mpsc::Receiver<Result<RawStreamEvent, ProviderError>>, ProviderError> {
            let script = self
                .events
                .lock()
                .unwrap()
                .take()
                .expect("ScriptedTransport::send called more than once");
            let (tx, rx) = mpsc::channel(script.len().max(1));
            for event in script {
                tx.send(event).await.expect("receiver not dropped");
            }
            Ok(rx)
        }
    }
}
