#![deny(missing_docs)]
//! In-memory implementation of `flo-core`'s [`StateStore`] trait.
//!
//! Uses a `HashMap` behind a `tokio::sync::RwLock` for concurrent access.
//! Scopes are serialized to strings and used as key prefixes, giving full
//! scope isolation without a schema. Search always returns empty — no
//! semantic search support in this backend.

use async_trait::async_trait;
use flo_core::effect::Scope;
use flo_core::state::{SearchResult, StateError, StateReader, StateStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory state store backed by a `HashMap` behind a `RwLock`.
///
/// Appropriate for tests, prototyping, and single-process use cases where
/// persistence across restarts is not required.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    /// Build a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn composite_key(scope: &Scope, key: &str) -> String {
    let scope_str = serde_json::to_string(scope).unwrap_or_else(|_| "unknown".to_string());
    format!("{scope_str}\0{key}")
}

fn extract_key<'a>(composite: &'a str, scope_prefix: &str) -> Option<&'a str> {
    composite
        .strip_prefix(scope_prefix)
        .and_then(|rest| rest.strip_prefix('\0'))
}

#[async_trait]
impl StateReader for MemoryStore {
    async fn read(&self, scope: &Scope, key: &str) -> Result<Option<serde_json::Value>, StateError> {
        let data = self.data.read().await;
        Ok(data.get(&composite_key(scope, key)).cloned())
    }

    async fn list(&self, scope: &Scope, prefix: &str) -> Result<Vec<String>, StateError> {
        let scope_prefix = serde_json::to_string(scope).unwrap_or_else(|_| "unknown".to_string());
        let data = self.data.read().await;
        Ok(data
            .keys()
            .filter_map(|composite| {
                extract_key(composite, &scope_prefix).and_then(|k| {
                    k.starts_with(prefix).then(|| k.to_string())
                })
            })
            .collect())
    }

    async fn search(
        &self,
        _scope: &Scope,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<SearchResult>, StateError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn write(&self, scope: &Scope, key: &str, value: serde_json::Value) -> Result<(), StateError> {
        let mut data = self.data.write().await;
        data.insert(composite_key(scope, key), value);
        Ok(())
    }

    async fn delete(&self, scope: &Scope, key: &str) -> Result<(), StateError> {
        let mut data = self.data.write().await;
        data.remove(&composite_key(scope, key));
        Ok(())
    }
}
