//! `AgentManager`: the root registry of live supervisors.
//!
//! Ambient supplement (not named by a dedicated section of the base
//! design, folded into the Supervisor & Lifecycle component): owns the set
//! of live [`AgentSupervisor`]s keyed by [`AgentId`], persists enough of
//! each supervisor's config and lifecycle state through a
//! [`PersistenceLayer`] to reconstruct the set after a process restart,
//! and exposes create/terminate operations that never touch sibling
//! agents.

use crate::config::AgentConfig;
use crate::error::SupervisorError;
use crate::persistence::{AgentMetadata, AgentRegistryEntry, PersistenceLayer};
use crate::supervisor::AgentSupervisor;
use flo_core::id::{AgentId, WorkflowId};
use flo_core::operator::Operator;
use flo_relay::InProcessRelay;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Owns the set of live [`AgentSupervisor`]s for one process.
pub struct AgentManager {
    supervisors: RwLock<HashMap<AgentId, Arc<AgentSupervisor>>>,
    relay: Arc<InProcessRelay>,
    persistence: Arc<dyn PersistenceLayer>,
}

impl AgentManager {
    /// Build an empty manager backed by the given relay and persistence layer.
    pub fn new(relay: Arc<InProcessRelay>, persistence: Arc<dyn PersistenceLayer>) -> Self {
        Self {
            supervisors: RwLock::new(HashMap::new()),
            relay,
            persistence,
        }
    }

    /// Create a new supervisor for `config` and add it to the live set.
    /// Does not start it — the caller decides when to call
    /// [`AgentSupervisor::start`].
    pub async fn create(&self, config: AgentConfig, operator: Arc<dyn Operator>) -> Arc<AgentSupervisor> {
        let id = config.id.clone();
        let workflow = WorkflowId::new(format!("wf-{id}"));
        let supervisor = Arc::new(AgentSupervisor::new(config, workflow, operator, self.relay.clone()));
        self.supervisors.write().await.insert(id, supervisor.clone());
        supervisor
    }

    /// Look up a live supervisor by id.
    pub async fn get(&self, id: &AgentId) -> Option<Arc<AgentSupervisor>> {
        self.supervisors.read().await.get(id).cloned()
    }

    /// Every live agent id, in no particular order.
    pub async fn ids(&self) -> Vec<AgentId> {
        self.supervisors.read().await.keys().cloned().collect()
    }

    /// Kill and remove a supervisor from the live set. Does not affect any
    /// other agent.
    pub async fn terminate(&self, id: &AgentId) {
        let supervisor = self.supervisors.write().await.remove(id);
        if let Some(supervisor) = supervisor {
            supervisor.kill().await;
        }
    }

    /// Persist enough of every live supervisor's config and lifecycle state
    /// to reconstruct the set on the next [`AgentManager::restore`].
    pub async fn checkpoint(&self) -> Result<(), SupervisorError> {
        let supervisors = self.supervisors.read().await;
        let mut entries = Vec::with_capacity(supervisors.len());
        for supervisor in supervisors.values() {
            let config = supervisor.config().await;
            let state = supervisor.state().await;
            entries.push(AgentRegistryEntry {
                id: config.id.clone(),
                config: serde_json::to_value(&config).map_err(|e| SupervisorError::Other(Box::new(e)))?,
                lifecycle_state: state.to_string(),
            });
            self.persistence
                .save_agent(AgentMetadata {
                    id: config.id.clone(),
                    name: config.name.clone(),
                    created_at: String::new(),
                    updated_at: String::new(),
                })
                .await?;
        }
        self.persistence.save_agent_registry(entries).await?;
        Ok(())
    }

    /// Rebuild the live set from the persisted registry. Each entry's
    /// `AgentConfig` is deserialized and handed to `build_operator` to
    /// produce the `Arc<dyn Operator>` that runs it — restoring an
    /// operator is a caller concern (it may need provider credentials,
    /// tool registries, or hub connections this layer does not own).
    pub async fn restore<F>(&self, build_operator: F) -> Result<usize, SupervisorError>
    where
        F: Fn(&AgentConfig) -> Arc<dyn Operator>,
    {
        let entries = self.persistence.load_agent_registry().await?;
        let mut restored = 0;
        for entry in entries {
            let config: AgentConfig = match serde_json::from_value(entry.config) {
                Ok(config) => config,
                Err(_) => continue,
            };
            let operator = build_operator(&config);
            self.create(config, operator).await;
            restored += 1;
        }
        Ok(restored)
    }
}
