//! Static-shell asset caching.
//!
//! Secondary, interface-level responsibility: cache-first-with-revalidation
//! for the supervisor's static shell assets. Orthogonal to API routing —
//! nothing here touches [`crate::config::InterceptorConfig`] except that
//! `force_refresh` is documented to preserve the credential store, which
//! falls out naturally from this module never holding one.

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Version-check cadence: once per hour, coalesced so concurrent callers
/// within the same hour share one check.
pub const VERSION_CHECK_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Persisted asset-cache bookkeeping: `currentVersion` and `lastVersionCheck`.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AssetCacheSnapshot {
    /// The shell version this cache was last built against.
    pub current_version: Option<String>,
    /// Epoch milliseconds of the last version check, for cadence coalescing.
    pub last_version_check: Option<u64>,
}

/// Persists [`AssetCacheSnapshot`] across restarts. An external collaborator,
/// same shape as [`crate::config::ConfigStore`].
#[async_trait]
pub trait AssetCacheStore: Send + Sync {
    /// Load the last-persisted snapshot, if any.
    async fn load(&self) -> AssetCacheSnapshot;
    /// Persist a snapshot, replacing whatever was stored before.
    async fn save(&self, snapshot: &AssetCacheSnapshot);
}

/// An in-memory [`AssetCacheStore`], for tests and single-process use.
#[derive(Default)]
pub struct MemoryAssetCacheStore {
    slot: RwLock<AssetCacheSnapshot>,
}

impl MemoryAssetCacheStore {
    /// Build a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetCacheStore for MemoryAssetCacheStore {
    async fn load(&self) -> AssetCacheSnapshot {
        self.slot.read().await.clone()
    }

    async fn save(&self, snapshot: &AssetCacheSnapshot) {
        *self.slot.write().await = snapshot.clone();
    }
}

/// A message the interceptor surfaces to the primary-document client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetCacheMessage {
    /// The shell version changed since the last check; the client should offer a reload.
    UpdateAvailable {
        /// The previous version, if one was known.
        previous: Option<String>,
        /// The newly observed version.
        current: String,
    },
}

/// Tracks the warmed URL set and version-check cadence for the shell asset
/// cache. Holds no credentials, so `force_refresh` clearing it is exactly
/// the "credential store preserved, all other caches empty" boundary case.
pub struct AssetCache {
    cached_urls: RwLock<HashSet<String>>,
    current_version: RwLock<Option<String>>,
    last_version_check_ms: RwLock<Option<u64>>,
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetCache {
    /// Build an empty cache with no warmed URLs and no known version.
    pub fn new() -> Self {
        Self {
            cached_urls: RwLock::new(HashSet::new()),
            current_version: RwLock::new(None),
            last_version_check_ms: RwLock::new(None),
        }
    }

    /// Rebuild from a persisted snapshot.
    pub fn from_snapshot(snapshot: AssetCacheSnapshot) -> Self {
        Self {
            cached_urls: RwLock::new(HashSet::new()),
            current_version: RwLock::new(snapshot.current_version),
            last_version_check_ms: RwLock::new(snapshot.last_version_check),
        }
    }

    /// Capture a persistable snapshot of version bookkeeping (not the warmed
    /// URL set, which is rebuilt on demand by `cache_urls`).
    pub async fn snapshot(&self) -> AssetCacheSnapshot {
        AssetCacheSnapshot {
            current_version: self.current_version.read().await.clone(),
            last_version_check: *self.last_version_check_ms.read().await,
        }
    }

    /// `cache_urls {urls}` — warm the shell cache with the given URLs.
    pub async fn cache_urls(&self, urls: impl IntoIterator<Item = String>) {
        let mut cached = self.cached_urls.write().await;
        cached.extend(urls);
    }

    /// Whether `url` is currently warmed.
    pub async fn is_cached(&self, url: &str) -> bool {
        self.cached_urls.read().await.contains(url)
    }

    /// `skip_waiting` — no asset content to swap in this port (there is no
    /// installing worker generation to promote); acknowledged as a no-op so
    /// callers expecting the message to be handled don't treat it as an error.
    pub fn skip_waiting(&self) {
        tracing::debug!("skip_waiting acknowledged");
    }

    /// `force_refresh` — clear every cache except the credential store
    /// (which this type never holds in the first place).
    pub async fn force_refresh(&self) {
        self.cached_urls.write().await.clear();
        *self.current_version.write().await = None;
        *self.last_version_check_ms.write().await = None;
    }

    /// Check whether `observed_version` differs from the last known version,
    /// coalescing checks that land within [`VERSION_CHECK_INTERVAL_MS`] of
    /// the previous one. `now_ms` is the caller's current epoch-millis clock
    /// reading, passed explicitly so the cadence logic is deterministic to test.
    pub async fn check_for_update(
        &self,
        now_ms: u64,
        observed_version: impl Into<String>,
    ) -> Option<AssetCacheMessage> {
        {
            let last_check = *self.last_version_check_ms.read().await;
            if let Some(last) = last_check {
                if now_ms.saturating_sub(last) < VERSION_CHECK_INTERVAL_MS {
                    return None;
                }
            }
        }
        *self.last_version_check_ms.write().await = Some(now_ms);

        let observed_version = observed_version.into();
        let mut current = self.current_version.write().await;
        let previous = current.clone();
        if previous.as_deref() == Some(observed_version.as_str()) {
            return None;
        }
        *current = Some(observed_version.clone());
        Some(AssetCacheMessage::UpdateAvailable {
            previous,
            current: observed_version,
        })
    }
}
