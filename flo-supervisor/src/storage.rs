//! The Storage Provider: per-agent file storage, consumed as an external
//! collaborator.
//!
//! Represented here only as a narrow, object-safe trait — no production
//! in-process implementation ships in this crate, only path validation
//! (shared by every implementation) and, behind the `test-utils` feature,
//! an in-memory double.

use async_trait::async_trait;
use flo_core::id::AgentId;
use thiserror::Error;

/// Maximum permitted path length, in bytes.
pub const MAX_PATH_LEN: usize = 512;

/// One entry returned by [`StorageProvider::list_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// The entry's base name.
    pub name: String,
    /// The entry's full path, relative to the agent's storage root.
    pub path: String,
    /// Whether the entry is itself a directory.
    pub is_directory: bool,
}

impl DirEntry {
    /// Build a new directory entry.
    pub fn new(name: impl Into<String>, path: impl Into<String>, is_directory: bool) -> Self {
        Self { name: name.into(), path: path.into(), is_directory }
    }
}

/// Errors from a [`StorageProvider`] call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The supplied path violates the path rules (empty, too long, contains a NUL, ...).
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// No file or directory exists at the given path.
    #[error("not found: {0}")]
    NotFound(String),
    /// The underlying backend rejected the operation.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Whether `path` denotes the agent's storage root (`.`, `/`, `./`, empty, or `root`).
pub fn is_root_path(path: &str) -> bool {
    matches!(path, "." | "/" | "./" | "" | "root")
}

/// Validate a path per the Storage Provider's path rules: non-empty, no
/// NUL byte, at most [`MAX_PATH_LEN`] bytes, at least one segment. A
/// root-denoting path is accepted here — it is the caller's job to reject
/// it for file (as opposed to directory) operations via
/// [`validate_file_path`].
pub fn validate_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty() {
        return Err(StorageError::InvalidPath("path must not be empty".into()));
    }
    if path.contains('\0') {
        return Err(StorageError::InvalidPath("path must not contain a NUL byte".into()));
    }
    if path.len() > MAX_PATH_LEN {
        return Err(StorageError::InvalidPath(format!("path exceeds {MAX_PATH_LEN} bytes")));
    }
    Ok(())
}

/// Validate a path for a file operation (`read`/`write`/`delete`): the
/// general path rules apply, and a root-denoting path is rejected — only
/// directory operations (`mkdir`/`listDir`) may target the root.
pub fn validate_file_path(path: &str) -> Result<(), StorageError> {
    validate_path(path)?;
    if is_root_path(path) {
        return Err(StorageError::InvalidPath(format!("{path:?} denotes the storage root; not valid for a file operation")));
    }
    Ok(())
}

/// Per-agent file storage, consumed by the supervisor. Paths are scoped to
/// `agent_id`'s own storage root; no implementation may resolve a path
/// outside it.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Read a file's contents as a UTF-8 string.
    async fn read_file(&self, agent_id: &AgentId, path: &str) -> Result<String, StorageError>;

    /// Write (creating or overwriting) a file.
    async fn write_file(&self, agent_id: &AgentId, path: &str, content: &str) -> Result<(), StorageError>;

    /// Delete a file. Deleting a missing file is an error (unlike state deletion).
    async fn delete_file(&self, agent_id: &AgentId, path: &str) -> Result<(), StorageError>;

    /// Create a directory, including any missing parents.
    async fn mkdir(&self, agent_id: &AgentId, path: &str) -> Result<(), StorageError>;

    /// List the immediate children of a directory.
    async fn list_dir(&self, agent_id: &AgentId, path: &str) -> Result<Vec<DirEntry>, StorageError>;
}

#[cfg(feature = "test-utils")]
pub use in_memory::InMemoryStorage;

#[cfg(feature = "test-utils")]
mod in_memory {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::RwLock;

    /// An in-memory [`StorageProvider`] double. Flat per-agent maps, no real
    /// directory tree — `mkdir` records the directory, `list_dir` returns
    /// every entry whose parent matches. Not a production backend.
    #[derive(Default)]
    pub struct InMemoryStorage {
        files: RwLock<BTreeMap<(AgentId, String), String>>,
        dirs: RwLock<BTreeMap<(AgentId, String), ()>>,
    }

    impl InMemoryStorage {
        /// Build an empty store.
        pub fn new() -> Self {
            Self::default()
        }

        fn parent_of(path: &str) -> String {
            match path.rsplit_once('/') {
                Some((parent, _)) if !parent.is_empty() => parent.to_string(),
                _ => "root".to_string(),
            }
        }
    }

    #[async_trait]
    impl StorageProvider for InMemoryStorage {
        async fn read_file(&self, agent_id: &AgentId, path: &str) -> Result<String, StorageError> {
            validate_file_path(path)?;
            self.files
                .read()
                .await
                .get(&(agent_id.clone(), path.to_string()))
                .cloned()
                .ok_or_else(|| StorageError::NotFound(path.to_string()))
        }

        async fn write_file(&self, agent_id: &AgentId, path: &str, content: &str) -> Result<(), StorageError> {
            validate_file_path(path)?;
            self.dirs.write().await.insert((agent_id.clone(), Self::parent_of(path)), ());
            self.files.write().await.insert((agent_id.clone(), path.to_string()), content.to_string());
            Ok(())
        }

        async fn delete_file(&self, agent_id: &AgentId, path: &str) -> Result<(), StorageError> {
            validate_file_path(path)?;
            self.files
                .write()
                .await
                .remove(&(agent_id.clone(), path.to_string()))
                .map(|_| ())
                .ok_or_else(|| StorageError::NotFound(path.to_string()))
        }

        async fn mkdir(&self, agent_id: &AgentId, path: &str) -> Result<(), StorageError> {
            validate_path(path)?;
            self.dirs.write().await.insert((agent_id.clone(), path.to_string()), ());
            Ok(())
        }

        async fn list_dir(&self, agent_id: &AgentId, path: &str) -> Result<Vec<DirEntry>, StorageError> {
            validate_path(path)?;
            let target = if is_root_path(path) { "root" } else { path };

            let mut entries = Vec::new();
            for (key, _) in self.files.read().await.iter() {
                if key.0 == *agent_id && Self::parent_of(&key.1) == target {
                    let name = key.1.rsplit('/').next().unwrap_or(&key.1).to_string();
                    entries.push(DirEntry::new(name, key.1.clone(), false));
                }
            }
            for (key, _) in self.dirs.read().await.iter() {
                if key.0 == *agent_id && key.1 != target && Self::parent_of(&key.1) == target {
                    let name = key.1.rsplit('/').next().unwrap_or(&key.1).to_string();
                    entries.push(DirEntry::new(name, key.1.clone(), true));
                }
            }
            Ok(entries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_invalid() {
        assert!(validate_path("").is_err());
    }

    #[test]
    fn nul_byte_is_invalid() {
        assert!(validate_path("a\0b").is_err());
    }

    #[test]
    fn overlong_path_is_invalid() {
        let path = "a".repeat(MAX_PATH_LEN + 1);
        assert!(validate_path(&path).is_err());
    }

    #[test]
    fn root_aliases_are_recognized() {
        for path in [".", "/", "./", "", "root"] {
            assert!(is_root_path(path), "{path:?} should be a root alias");
        }
        assert!(!is_root_path("notes.md"));
    }

    #[test]
    fn file_path_rejects_root_aliases() {
        assert!(validate_file_path("root").is_err());
        assert!(validate_file_path("notes.md").is_ok());
    }

    #[cfg(feature = "test-utils")]
    #[tokio::test]
    async fn in_memory_storage_round_trips_a_file() {
        use super::in_memory::InMemoryStorage;

        let store = InMemoryStorage::new();
        let agent = AgentId::new("a1");
        store.write_file(&agent, "notes.md", "hello").await.unwrap();
        assert_eq!(store.read_file(&agent, "notes.md").await.unwrap(), "hello");
    }

    #[cfg(feature = "test-utils")]
    #[tokio::test]
    async fn in_memory_storage_reports_missing_files() {
        use super::in_memory::InMemoryStorage;

        let store = InMemoryStorage::new();
        let agent = AgentId::new("a1");
        assert!(store.read_file(&agent, "ghost.md").await.is_err());
    }

    #[cfg(feature = "test-utils")]
    #[tokio::test]
    async fn in_memory_storage_lists_directory_contents() {
        use super::in_memory::InMemoryStorage;

        let store = InMemoryStorage::new();
        let agent = AgentId::new("a1");
        store.write_file(&agent, "notes.md", "hello").await.unwrap();
        store.mkdir(&agent, "logs").await.unwrap();

        let entries = store.list_dir(&agent, "root").await.unwrap();
        assert!(entries.iter().any(|e| e.name == "notes.md" && !e.is_directory));
    }

    #[cfg(feature = "test-utils")]
    #[tokio::test]
    async fn in_memory_storage_scopes_files_per_agent() {
        use super::in_memory::InMemoryStorage;

        let store = InMemoryStorage::new();
        let a1 = AgentId::new("a1");
        let a2 = AgentId::new("a2");
        store.write_file(&a1, "notes.md", "a1 notes").await.unwrap();
        assert!(store.read_file(&a2, "notes.md").await.is_err());
    }
}
