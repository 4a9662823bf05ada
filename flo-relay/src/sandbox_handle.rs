//! Opaque worker identity tokens.
//!
//! The browser spec checks "is this still *my* sandbox document" by comparing
//! a held `Window` reference against `event.source`. There is no window
//! reference in a native process, so the same check is ported as comparing
//! an opaque, unforgeable token handed out when a worker is registered
//! against the token presented by whatever is asking to act as that worker.
//! A stale or forged token fails the comparison exactly like a stale window
//! reference would.

use flo_core::id::WorkerId;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// An opaque handle identifying one live worker registration.
///
/// Two handles compare equal only if they were issued for the same
/// [`WorkerId`] in the same registration generation — re-registering the
/// same worker id (after it was deregistered and recreated) issues a new
/// generation, so a handle held from before the recreation no longer
/// compares equal to the current one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SandboxHandle {
    worker: WorkerId,
    generation: u64,
}

impl SandboxHandle {
    /// Mint a fresh handle for `worker`, guaranteed distinct from any
    /// previously minted handle (even one for the same worker id).
    pub fn issue(worker: WorkerId) -> Self {
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        Self { worker, generation }
    }

    /// The worker this handle identifies.
    pub fn worker(&self) -> &WorkerId {
        &self.worker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_for_distinct_registrations_never_compare_equal() {
        let a = SandboxHandle::issue(WorkerId::new("w1"));
        let b = SandboxHandle::issue(WorkerId::new("w1"));
        assert_eq!(a.worker(), b.worker());
        assert_ne!(a, b, "recreating a worker must mint a fresh generation");
    }

    #[test]
    fn a_handle_equals_itself() {
        let a = SandboxHandle::issue(WorkerId::new("w1"));
        assert_eq!(a, a.clone());
    }
}
