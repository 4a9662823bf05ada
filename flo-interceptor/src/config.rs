//! Persistent interceptor configuration and the messages that update it.
//!
//! Per §4.4, this configuration must survive a process restart that happens
//! before the supervisor reconnects — a request may be issued against
//! `/api/<provider>/...` with nothing else running yet. [`ConfigStore`] is
//! the narrow persistence seam that makes that true; the interceptor itself
//! only holds the in-memory working copy plus a handle to write it through.

use crate::credential::ApiKey;
use crate::error::InterceptorError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Where a configuration message originated. Only [`MessageSource::PrimaryDocument`]
/// may update credentials, hub routing, or the API base — per the design
/// notes, "reject configuration from untrusted sources."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// The supervisor's own primary document — trusted.
    PrimaryDocument,
    /// Any other origin (a sandboxed agent, a page script, a hub frame).
    Untrusted,
}

/// The interceptor's working configuration.
///
/// Mirrors the data model 1:1: a per-provider key map, optional hub routing,
/// and an optional API base-url override. `Default` yields the "nothing
/// configured yet" state every fresh install starts from.
#[derive(Default)]
pub struct InterceptorConfig {
    api_keys: HashMap<String, ApiKey>,
    hub_mode: bool,
    hub_http_url: Option<String>,
    hub_token: Option<ApiKey>,
    api_base_url: Option<String>,
}

impl InterceptorConfig {
    /// Build an empty configuration (no keys, no hub, no base-url override).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire per-provider key map.
    pub fn configure_keys(
        &mut self,
        source: MessageSource,
        keys: HashMap<String, String>,
    ) -> Result<(), InterceptorError> {
        require_primary(source, "configure_keys")?;
        self.api_keys = keys.into_iter().map(|(k, v)| (k, ApiKey::new(v))).collect();
        Ok(())
    }

    /// Configure (or disable) hub-mode routing. `http_url` must be `http://`
    /// or `https://` when `enabled` is set; anything else is rejected and
    /// the prior configuration is left untouched.
    pub fn configure_hub(
        &mut self,
        source: MessageSource,
        enabled: bool,
        http_url: Option<String>,
        token: Option<String>,
    ) -> Result<(), InterceptorError> {
        require_primary(source, "configure_hub")?;
        if enabled {
            let url = http_url
                .as_deref()
                .ok_or_else(|| InterceptorError::Config("hub enabled with no httpUrl".into()))?;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(InterceptorError::Config(format!(
                    "hub httpUrl must be http(s), got: {url}"
                )));
            }
        }
        self.hub_mode = enabled;
        self.hub_http_url = http_url;
        self.hub_token = token.map(ApiKey::new);
        Ok(())
    }

    /// Configure (or, with an empty string, disable) the API base-url override.
    pub fn configure_api_base(
        &mut self,
        source: MessageSource,
        api_base_url: String,
    ) -> Result<(), InterceptorError> {
        require_primary(source, "configure_api_base")?;
        self.api_base_url = if api_base_url.is_empty() {
            None
        } else {
            Some(api_base_url)
        };
        Ok(())
    }

    /// `true` if hub-mode routing is active and has a destination URL.
    pub fn hub_active(&self) -> bool {
        self.hub_mode && self.hub_http_url.is_some()
    }

    /// The hub's HTTP URL, if hub-mode is active.
    pub fn hub_http_url(&self) -> Option<&str> {
        self.hub_http_url.as_deref()
    }

    /// Run `f` with the hub token's bytes, if one is configured.
    pub fn with_hub_token<R>(&self, f: impl FnOnce(&str) -> R) -> Option<R> {
        self.hub_token.as_ref().map(|t| t.with_bytes(f))
    }

    /// `true` if a key is configured for `provider`.
    pub fn has_key(&self, provider: &str) -> bool {
        self.api_keys.contains_key(provider)
    }

    /// Run `f` with `provider`'s key bytes, if one is configured.
    pub fn with_key<R>(&self, provider: &str, f: impl FnOnce(&str) -> R) -> Option<R> {
        self.api_keys.get(provider).map(|k| k.with_bytes(f))
    }

    /// The configured API base-url override, if any.
    pub fn api_base_url(&self) -> Option<&str> {
        self.api_base_url.as_deref()
    }
}

fn require_primary(source: MessageSource, message: &'static str) -> Result<(), InterceptorError> {
    match source {
        MessageSource::PrimaryDocument => Ok(()),
        MessageSource::Untrusted => Err(InterceptorError::UntrustedSource(message)),
    }
}

/// A snapshot of [`InterceptorConfig`] suitable for persistence. Credentials
/// are carried as plain strings here deliberately — this is the boundary
/// where they leave memory for a durable store, which is outside this
/// crate's concern (a [`ConfigStore`] implementation might encrypt at rest).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ConfigSnapshot {
    /// Per-provider API keys.
    pub api_keys: HashMap<String, String>,
    /// Whether hub-mode routing is enabled.
    pub hub_mode: bool,
    /// The hub's HTTP URL, if configured.
    pub hub_http_url: Option<String>,
    /// The hub auth token, if configured.
    pub hub_token: Option<String>,
    /// The API base-url override, if configured.
    pub api_base_url: Option<String>,
}

impl InterceptorConfig {
    /// Capture a persistable snapshot of the current configuration.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            api_keys: self
                .api_keys
                .iter()
                .map(|(provider, key)| (provider.clone(), key.with_bytes(|s| s.to_string())))
                .collect(),
            hub_mode: self.hub_mode,
            hub_http_url: self.hub_http_url.clone(),
            hub_token: self.hub_token.as_ref().map(|t| t.with_bytes(|s| s.to_string())),
            api_base_url: self.api_base_url.clone(),
        }
    }

    /// Rebuild a working configuration from a persisted snapshot.
    pub fn from_snapshot(snapshot: ConfigSnapshot) -> Self {
        Self {
            api_keys: snapshot
                .api_keys
                .into_iter()
                .map(|(k, v)| (k, ApiKey::new(v)))
                .collect(),
            hub_mode: snapshot.hub_mode,
            hub_http_url: snapshot.hub_http_url,
            hub_token: snapshot.hub_token.map(ApiKey::new),
            api_base_url: snapshot.api_base_url,
        }
    }
}

/// Persists the interceptor's configuration so it survives a process
/// restart that happens before the supervisor reconnects.
///
/// This is an external collaborator per §1's "interfaces only" scoping —
/// the concrete backend (a file, a keystore, a platform-native secret
/// store) is not this crate's concern, only the shape it persists.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the last-persisted snapshot, if any has ever been saved.
    async fn load(&self) -> Result<Option<ConfigSnapshot>, InterceptorError>;
    /// Persist a snapshot, replacing whatever was stored before.
    async fn save(&self, snapshot: &ConfigSnapshot) -> Result<(), InterceptorError>;
}

/// An in-memory [`ConfigStore`], for tests and single-process use with no
/// durability across restarts.
#[derive(Default)]
pub struct MemoryConfigStore {
    slot: tokio::sync::RwLock<Option<ConfigSnapshot>>,
}

impl MemoryConfigStore {
    /// Build a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Option<ConfigSnapshot>, InterceptorError> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, snapshot: &ConfigSnapshot) -> Result<(), InterceptorError> {
        *self.slot.write().await = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untrusted_source_cannot_configure_keys() {
        let mut cfg = InterceptorConfig::new();
        let mut keys = HashMap::new();
        keys.insert("anthropic".to_string(), "sk-1".to_string());
        let err = cfg.configure_keys(MessageSource::Untrusted, keys).unwrap_err();
        assert!(matches!(err, InterceptorError::UntrustedSource("configure_keys")));
        assert!(!cfg.has_key("anthropic"));
    }

    #[test]
    fn primary_document_can_configure_keys() {
        let mut cfg = InterceptorConfig::new();
        let mut keys = HashMap::new();
        keys.insert("anthropic".to_string(), "sk-1".to_string());
        cfg.configure_keys(MessageSource::PrimaryDocument, keys).unwrap();
        assert!(cfg.has_key("anthropic"));
        assert_eq!(cfg.with_key("anthropic", |s| s.to_string()), Some("sk-1".to_string()));
    }

    #[test]
    fn configure_hub_rejects_non_http_url_and_preserves_prior_config() {
        let mut cfg = InterceptorConfig::new();
        let mut keys = HashMap::new();
        keys.insert("anthropic".to_string(), "sk-1".to_string());
        cfg.configure_keys(MessageSource::PrimaryDocument, keys).unwrap();

        let err = cfg
            .configure_hub(
                MessageSource::PrimaryDocument,
                true,
                Some("ftp://hub.example.com".into()),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, InterceptorError::Config(_)));
        assert!(!cfg.hub_active());
        assert!(cfg.has_key("anthropic"), "prior key config must be preserved");
    }

    #[test]
    fn configure_hub_accepts_https() {
        let mut cfg = InterceptorConfig::new();
        cfg.configure_hub(
            MessageSource::PrimaryDocument,
            true,
            Some("https://hub.example.com".into()),
            Some("tok".into()),
        )
        .unwrap();
        assert!(cfg.hub_active());
        assert_eq!(cfg.hub_http_url(), Some("https://hub.example.com"));
    }

    #[test]
    fn configure_api_base_empty_string_disables_override() {
        let mut cfg = InterceptorConfig::new();
        cfg.configure_api_base(MessageSource::PrimaryDocument, "https://proxy.example.com".into())
            .unwrap();
        assert_eq!(cfg.api_base_url(), Some("https://proxy.example.com"));
        cfg.configure_api_base(MessageSource::PrimaryDocument, String::new()).unwrap();
        assert_eq!(cfg.api_base_url(), None);
    }

    #[test]
    fn snapshot_round_trips_through_from_snapshot() {
        let mut cfg = InterceptorConfig::new();
        let mut keys = HashMap::new();
        keys.insert("anthropic".to_string(), "sk-1".to_string());
        cfg.configure_keys(MessageSource::PrimaryDocument, keys).unwrap();
        cfg.configure_hub(
            MessageSource::PrimaryDocument,
            true,
            Some("https://hub.example.com".into()),
            Some("tok".into()),
        )
        .unwrap();

        let snapshot = cfg.snapshot();
        let restored = InterceptorConfig::from_snapshot(snapshot);
        assert!(restored.has_key("anthropic"));
        assert!(restored.hub_active());
    }

    #[tokio::test]
    async fn memory_config_store_round_trips() {
        let store = MemoryConfigStore::new();
        assert!(store.load().await.unwrap().is_none());
        let snapshot = ConfigSnapshot {
            api_keys: HashMap::new(),
            hub_mode: false,
            hub_http_url: None,
            hub_token: None,
            api_base_url: Some("https://proxy.example.com".into()),
        };
        store.save(&snapshot).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.api_base_url, Some("https://proxy.example.com".into()));
    }
}
