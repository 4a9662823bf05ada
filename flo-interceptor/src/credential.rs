//! Zeroizing, scoped-exposure credential storage.
//!
//! Per the design notes, the interceptor owns every credential exclusively —
//! "no worker ever sees an API key" — so the value type backing that
//! exclusivity must make accidental retention or logging structurally hard,
//! not merely a documented convention. [`ApiKey`] has no `Clone`, no
//! `Display`, no `Serialize`, and a `Debug` impl that redacts; the only way
//! to read the bytes is [`ApiKey::with_bytes`], which exposes them only for
//! the duration of the closure.

use zeroize::Zeroizing;

/// An opaque API key or hub token. Cannot be logged, serialized, or cloned.
/// Memory is zeroed on drop.
pub struct ApiKey {
    inner: Zeroizing<String>,
}

impl ApiKey {
    /// Wrap a secret string. The input is moved, not copied.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: Zeroizing::new(value.into()),
        }
    }

    /// Scoped exposure. The key is only visible inside the closure.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.inner)
    }

    /// `true` if the wrapped value has no characters.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

// Intentionally no Clone, Display, Serialize, or PartialEq.
