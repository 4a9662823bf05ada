//! The Persistence Layer: settings, the agent registry, and conversation
//! history, consumed as an external collaborator.
//!
//! Represented here only as a narrow, object-safe trait — no production
//! in-process implementation ships in this crate, only the export/import
//! envelope shape (shared by every implementation) and, behind the
//! `test-utils` feature, an in-memory double.

use async_trait::async_trait;
use flo_core::content::Message;
use flo_core::id::AgentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Global, non-agent-scoped settings.
pub type Settings = Value;

/// Metadata about one registered agent, independent of its live config
/// (which lives in [`crate::config::AgentConfig`]) — this is what
/// `listAgents` enumerates without loading each agent's full conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// The agent's id.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// When the agent was created, as an opaque backend-defined timestamp string.
    pub created_at: String,
    /// When the agent's config was last updated.
    pub updated_at: String,
}

/// The serialized shape of a supervisor's durable state, enough to
/// reconstruct it after a process restart. Mirrors the Agent Manager's
/// ambient-supplement responsibility of persisting "enough of each
/// supervisor's `AgentConfig` and lifecycle state".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRegistryEntry {
    /// The agent's id.
    pub id: AgentId,
    /// Serialized `AgentConfig`, opaque to this layer.
    pub config: Value,
    /// Serialized lifecycle state name (`"pending"`, `"running"`, ...).
    pub lifecycle_state: String,
}

/// The full export/import envelope. Top-level arrays for settings, agents,
/// conversation messages, and the registry, per the external interfaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportBundle {
    /// Global settings, if any were set.
    pub settings: Option<Settings>,
    /// Every agent's metadata.
    pub agents: Vec<AgentMetadata>,
    /// Every agent's conversation history, as `(agent_id, messages)` pairs.
    pub conversations: Vec<(AgentId, Vec<Message>)>,
    /// The agent registry entries.
    pub registry: Vec<AgentRegistryEntry>,
}

/// Errors from a [`PersistenceLayer`] call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    /// No agent registered under the given id.
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    /// The stored or imported data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The underlying backend rejected the operation.
    #[error("persistence backend error: {0}")]
    Backend(String),
    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Settings, the agent registry, and conversation history, consumed by the
/// supervisor and the Agent Manager.
#[async_trait]
pub trait PersistenceLayer: Send + Sync {
    /// Load global settings, if any have been saved.
    async fn get_settings(&self) -> Result<Option<Settings>, PersistenceError>;
    /// Replace global settings wholesale.
    async fn save_settings(&self, settings: Settings) -> Result<(), PersistenceError>;

    /// Save (creating or overwriting) an agent's metadata.
    async fn save_agent(&self, metadata: AgentMetadata) -> Result<(), PersistenceError>;
    /// Load one agent's metadata.
    async fn load_agent(&self, agent_id: &AgentId) -> Result<AgentMetadata, PersistenceError>;
    /// List every registered agent's metadata.
    async fn list_agents(&self) -> Result<Vec<AgentMetadata>, PersistenceError>;
    /// Merge a partial metadata update into a registered agent.
    async fn update_agent_metadata(&self, agent_id: &AgentId, name: Option<String>, updated_at: String) -> Result<(), PersistenceError>;
    /// Delete an agent's metadata, conversation, and registry entry.
    async fn delete_agent(&self, agent_id: &AgentId) -> Result<(), PersistenceError>;

    /// Append one message to an agent's conversation history.
    async fn append_conversation(&self, agent_id: &AgentId, message: Message) -> Result<(), PersistenceError>;
    /// Load an agent's full conversation history, in append order.
    async fn load_conversation(&self, agent_id: &AgentId) -> Result<Vec<Message>, PersistenceError>;

    /// Save the full agent registry wholesale.
    async fn save_agent_registry(&self, entries: Vec<AgentRegistryEntry>) -> Result<(), PersistenceError>;
    /// Load the full agent registry.
    async fn load_agent_registry(&self) -> Result<Vec<AgentRegistryEntry>, PersistenceError>;
    /// Clear the agent registry without touching per-agent metadata or conversations.
    async fn clear_agent_registry(&self) -> Result<(), PersistenceError>;

    /// Export everything this layer holds into one bundle.
    async fn export_data(&self) -> Result<ExportBundle, PersistenceError>;
    /// Import a bundle, replacing any data it names (agents not named are left untouched).
    async fn import_data(&self, bundle: ExportBundle) -> Result<(), PersistenceError>;

    /// Erase every setting, agent, conversation, and registry entry.
    async fn clear_all(&self) -> Result<(), PersistenceError>;
}

#[cfg(feature = "test-utils")]
pub use in_memory::InMemoryPersistence;

#[cfg(feature = "test-utils")]
mod in_memory {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::RwLock;

    /// An in-memory [`PersistenceLayer`] double. Not a production backend:
    /// nothing here survives process exit.
    #[derive(Default)]
    pub struct InMemoryPersistence {
        settings: RwLock<Option<Settings>>,
        agents: RwLock<BTreeMap<AgentId, AgentMetadata>>,
        conversations: RwLock<BTreeMap<AgentId, Vec<Message>>>,
        registry: RwLock<Vec<AgentRegistryEntry>>,
    }

    impl InMemoryPersistence {
        /// Build an empty store.
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PersistenceLayer for InMemoryPersistence {
        async fn get_settings(&self) -> Result<Option<Settings>, PersistenceError> {
            Ok(self.settings.read().await.clone())
        }

        async fn save_settings(&self, settings: Settings) -> Result<(), PersistenceError> {
            *self.settings.write().await = Some(settings);
            Ok(())
        }

        async fn save_agent(&self, metadata: AgentMetadata) -> Result<(), PersistenceError> {
            self.agents.write().await.insert(metadata.id.clone(), metadata);
            Ok(())
        }

        async fn load_agent(&self, agent_id: &AgentId) -> Result<AgentMetadata, PersistenceError> {
            self.agents
                .read()
                .await
                .get(agent_id)
                .cloned()
                .ok_or_else(|| PersistenceError::AgentNotFound(agent_id.to_string()))
        }

        async fn list_agents(&self) -> Result<Vec<AgentMetadata>, PersistenceError> {
            Ok(self.agents.read().await.values().cloned().collect())
        }

        async fn update_agent_metadata(&self, agent_id: &AgentId, name: Option<String>, updated_at: String) -> Result<(), PersistenceError> {
            let mut agents = self.agents.write().await;
            let metadata = agents
                .get_mut(agent_id)
                .ok_or_else(|| PersistenceError::AgentNotFound(agent_id.to_string()))?;
            if let Some(name) = name {
                metadata.name = name;
            }
            metadata.updated_at = updated_at;
            Ok(())
        }

        async fn delete_agent(&self, agent_id: &AgentId) -> Result<(), PersistenceError> {
            self.agents.write().await.remove(agent_id);
            self.conversations.write().await.remove(agent_id);
            self.registry.write().await.retain(|e| &e.id != agent_id);
            Ok(())
        }

        async fn append_conversation(&self, agent_id: &AgentId, message: Message) -> Result<(), PersistenceError> {
            self.conversations.write().await.entry(agent_id.clone()).or_default().push(message);
            Ok(())
        }

        async fn load_conversation(&self, agent_id: &AgentId) -> Result<Vec<Message>, PersistenceError> {
            Ok(self.conversations.read().await.get(agent_id).cloned().unwrap_or_default())
        }

        async fn save_agent_registry(&self, entries: Vec<AgentRegistryEntry>) -> Result<(), PersistenceError> {
            *self.registry.write().await = entries;
            Ok(())
        }

        async fn load_agent_registry(&self) -> Result<Vec<AgentRegistryEntry>, PersistenceError> {
            Ok(self.registry.read().await.clone())
        }

        async fn clear_agent_registry(&self) -> Result<(), PersistenceError> {
            self.registry.write().await.clear();
            Ok(())
        }

        async fn export_data(&self) -> Result<ExportBundle, PersistenceError> {
            Ok(ExportBundle {
                settings: self.settings.read().await.clone(),
                agents: self.agents.read().await.values().cloned().collect(),
                conversations: self.conversations.read().await.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                registry: self.registry.read().await.clone(),
            })
        }

        async fn import_data(&self, bundle: ExportBundle) -> Result<(), PersistenceError> {
            if let Some(settings) = bundle.settings {
                *self.settings.write().await = Some(settings);
            }
            let mut agents = self.agents.write().await;
            for metadata in bundle.agents {
                agents.insert(metadata.id.clone(), metadata);
            }
            drop(agents);
            let mut conversations = self.conversations.write().await;
            for (agent_id, messages) in bundle.conversations {
                conversations.insert(agent_id, messages);
            }
            drop(conversations);
            self.registry.write().await.extend(bundle.registry);
            Ok(())
        }

        async fn clear_all(&self) -> Result<(), PersistenceError> {
            *self.settings.write().await = None;
            self.agents.write().await.clear();
            self.conversations.write().await.clear();
            self.registry.write().await.clear();
            Ok(())
        }
    }
}
