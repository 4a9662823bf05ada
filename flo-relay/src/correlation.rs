//! The correlation table: `Map<id, {resolve, reject, timer}>`.
//!
//! Per the design notes, the promise-per-correlation pattern is the
//! canonical shape for any cross-boundary request/response — it survives
//! any language port and should never be replaced by scattered ad-hoc
//! waiters. This is the one correlation table the rest of the relay is
//! built on: `tool_call`, `dom_*`, `file_*`, `state_*`, and `ask` requests
//! all register here under an id prefixed by their kind.
//!
//! Every emitted id eventually observes exactly one of `{response, timeout,
//! cancellation}`; `resolve` consumes the registration so a second resolve
//! (or a timeout racing a resolve) is a no-op rather than a double-fire.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

/// Why a correlated request did not resolve with a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationFailure {
    /// No response arrived before the configured timeout.
    Timeout,
    /// The request was explicitly cancelled (`stop_agent`, shutdown).
    Cancelled,
}

/// Default per-kind timeouts, in milliseconds, per the concurrency model.
pub mod default_timeout {
    use std::time::Duration;

    /// `tool_call` correlations.
    pub const TOOL_CALL: Duration = Duration::from_secs(30);
    /// `dom_*` correlations.
    pub const DOM: Duration = Duration::from_secs(10);
    /// `file_*` correlations.
    pub const FILE: Duration = Duration::from_secs(30);
    /// `state_*` correlations.
    pub const STATE: Duration = Duration::from_secs(5);
    /// `ask` correlations.
    pub const ASK: Duration = Duration::from_secs(120);
}

/// A table of pending correlated requests, keyed by a locally unique string id.
///
/// Generic over the resolved value type so the same table shape backs
/// `tool_result`, `dom_result`, `file_result`, `state_result`, and
/// `agent_ask_response` payloads without one bespoke map per kind.
pub struct CorrelationTable<T> {
    pending: Mutex<HashMap<String, oneshot::Sender<T>>>,
}

impl<T> Default for CorrelationTable<T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Send + 'static> CorrelationTable<T> {
    /// Build a new, empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new correlation id, returning the receiver half.
    ///
    /// Panics if `id` is already registered — ids must be emitted-once per
    /// the invariant; a caller that generates a colliding id has a bug one
    /// layer up, not something this table should paper over.
    pub fn register(&self, id: impl Into<String>) -> oneshot::Receiver<T> {
        let (tx, rx) = oneshot::channel();
        let id = id.into();
        let mut pending = self.pending.lock().expect("correlation table poisoned");
        assert!(
            pending.insert(id.clone(), tx).is_none(),
            "correlation id emitted twice: {id}"
        );
        rx
    }

    /// Resolve a pending id with a value. `true` if something was pending
    /// (resolved-at-most-once: a second resolve of the same id is a no-op
    /// because the first `register` already removed it from the map).
    pub fn resolve(&self, id: &str, value: T) -> bool {
        let sender = self.pending.lock().expect("correlation table poisoned").remove(id);
        match sender {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    /// Cancel one pending id. Dropping the sender makes the matching
    /// `await` on the receiver observe a closed channel.
    pub fn cancel(&self, id: &str) -> bool {
        self.pending.lock().expect("correlation table poisoned").remove(id).is_some()
    }

    /// Cancel every pending id (supervisor shutdown / `stop_agent`).
    /// Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut pending = self.pending.lock().expect("correlation table poisoned");
        let n = pending.len();
        pending.clear();
        n
    }

    /// How many requests are currently pending.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("correlation table poisoned").len()
    }
}

/// Await a correlation receiver with a timeout, collapsing the three ways
/// it can end into one [`CorrelationFailure`]-shaped result.
///
/// A dropped sender (explicit [`CorrelationTable::cancel`] or
/// [`CorrelationTable::cancel_all`]) and a timeout are both observable here
/// even though only the sender side can tell the two apart by racing
/// `tokio::time::timeout` against the receiver — cancellation always wins
/// if it already happened, since the channel is already closed by the time
/// this is polled.
pub async fn await_correlated<T>(
    rx: oneshot::Receiver<T>,
    timeout: Duration,
) -> Result<T, CorrelationFailure> {
    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => Err(CorrelationFailure::Cancelled),
        Err(_) => Err(CorrelationFailure::Timeout),
    }
}
