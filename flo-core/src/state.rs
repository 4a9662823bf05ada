//! The scoped key/value state boundary.
//!
//! Backs `flo.state.{get,set,getAll}` and `flo.storage.{get,set,delete,list}`
//! from the page-side API. Compaction and versioning are deliberately not
//! part of this trait — those are concerns of whichever backend chooses to
//! support them.

use crate::effect::Scope;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from a [`StateStore`] backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StateError {
    /// No value at the given scope/key.
    #[error("not found: {scope:?}/{key}")]
    NotFound {
        /// The scope that was queried.
        scope: Scope,
        /// The key that was queried.
        key: String,
    },
    /// The write failed.
    #[error("write failed: {0}")]
    WriteFailed(String),
    /// The stored value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A single search hit, for backends that support `search`.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched key.
    pub key: String,
    /// Relevance score (backend-defined scale).
    pub score: f64,
    /// An optional excerpt.
    pub snippet: Option<String>,
}

impl SearchResult {
    /// Build a new search result.
    pub fn new(key: impl Into<String>, score: f64, snippet: Option<String>) -> Self {
        Self {
            key: key.into(),
            score,
            snippet,
        }
    }
}

/// Read-only subset of [`StateStore`].
///
/// An agentic loop receives `&dyn StateReader`, never `&dyn StateStore`: it
/// can read its own scratch state and search, but writes only happen via a
/// declared [`crate::effect::Effect::WriteMemory`] the caller chooses to apply.
#[async_trait]
pub trait StateReader: Send + Sync {
    /// Read a single value.
    async fn read(&self, scope: &Scope, key: &str) -> Result<Option<Value>, StateError>;

    /// List keys under a scope, optionally filtered by prefix.
    async fn list(&self, scope: &Scope, prefix: &str) -> Result<Vec<String>, StateError>;

    /// Search for keys/values matching a free-text query. Backends without
    /// search support return an empty vec, not an error.
    async fn search(
        &self,
        scope: &Scope,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StateError>;
}

/// Full read/write state boundary, implemented by concrete backends.
#[async_trait]
pub trait StateStore: StateReader {
    /// Write a value.
    async fn write(&self, scope: &Scope, key: &str, value: Value) -> Result<(), StateError>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn delete(&self, scope: &Scope, key: &str) -> Result<(), StateError>;
}
