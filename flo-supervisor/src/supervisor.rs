//! `AgentSupervisor`: owns one agent's sandbox document, subworker
//! registry, and lifecycle state.
//!
//! Composes [`flo_relay::InProcessRelay`] (the main worker's command
//! queue), a [`flo_core::sandbox::SandboxEnvironment`] (the isolation the
//! main worker's operator runs inside — wired in by the caller when
//! building the `Arc<dyn Operator>` passed to [`AgentSupervisor::new`]),
//! [`crate::budget::BudgetAccumulator`], and [`crate::subworker::SubworkerRegistry`]
//! into the single object that owns one agent end to end.

use crate::budget::{BudgetAccumulator, BudgetOutcome};
use crate::config::{AgentConfig, ConfigUpdate};
use crate::error::SupervisorError;
use crate::lifecycle::{SupervisorState, Transition};
use crate::subworker::{SubworkerConfig, SubworkerRegistry};
use chrono::{DateTime, Utc};
use flo_core::effect::SignalPayload;
use flo_core::event::AgentEvent;
use flo_core::id::{AgentId, SubworkerId, WorkflowId};
use flo_core::operator::Operator;
use flo_core::relay::RelayQuery;
use flo_relay::InProcessRelay;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

/// Owns one agent's configuration, lifecycle state, budget, and subworker
/// registry, and drives it through [`flo_relay::InProcessRelay`].
pub struct AgentSupervisor {
    id: AgentId,
    workflow: WorkflowId,
    config: RwLock<AgentConfig>,
    state: RwLock<SupervisorState>,
    budget: RwLock<BudgetAccumulator>,
    subworkers: RwLock<SubworkerRegistry>,
    visible: RwLock<bool>,
    operator: Arc<dyn Operator>,
    relay: Arc<InProcessRelay>,
    events: mpsc::UnboundedSender<AgentEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<AgentEvent>>>,
}

impl AgentSupervisor {
    /// Build a new supervisor in `pending` state. `workflow` is the
    /// [`WorkflowId`] this agent's running instance is announced under once
    /// started — one per supervisor's lifetime, reused across restarts.
    pub fn new(config: AgentConfig, workflow: WorkflowId, operator: Arc<dyn Operator>, relay: Arc<InProcessRelay>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            id: config.id.clone(),
            workflow,
            config: RwLock::new(config),
            state: RwLock::new(SupervisorState::Pending),
            budget: RwLock::new(BudgetAccumulator::new()),
            subworkers: RwLock::new(SubworkerRegistry::new()),
            visible: RwLock::new(false),
            operator,
            relay,
            events: tx,
            event_rx: Mutex::new(Some(rx)),
        }
    }

    /// This supervisor's agent id.
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SupervisorState {
        *self.state.read().await
    }

    /// A snapshot of the current configuration.
    pub async fn config(&self) -> AgentConfig {
        self.config.read().await.clone()
    }

    /// Current budget totals.
    pub async fn budget(&self) -> BudgetAccumulator {
        self.budget.read().await.clone()
    }

    /// Take this supervisor's event stream. Callable exactly once; a second
    /// call returns `None`, matching [`flo_hub::HubLink::events`]'s
    /// take-once contract for the same reason: there is one logical
    /// consumer (the surrounding UI or a hub relay), not a broadcast fan-out.
    pub async fn events(&self) -> Option<mpsc::UnboundedReceiver<AgentEvent>> {
        self.event_rx.lock().await.take()
    }

    async fn emit_state_change(&self, reason: Option<String>) {
        let state = self.state().await;
        let _ = self.events.send(AgentEvent::StateChange {
            agent: self.id.clone(),
            state: state.to_string(),
            reason,
        });
    }

    async fn apply_transition(&self, transition: Transition) -> Result<SupervisorState, SupervisorError> {
        let mut state = self.state.write().await;
        let next = state.apply(transition)?;
        *state = next;
        Ok(next)
    }

    /// Create the main worker and transition `pending → running`.
    pub async fn start(&self) -> Result<(), SupervisorError> {
        self.apply_transition(Transition::Start).await?;
        self.relay.register_agent(self.id.clone(), self.operator.clone()).await;
        self.relay.announce_workflow(self.workflow.clone(), &self.id).await?;
        self.emit_state_change(None).await;
        Ok(())
    }

    /// Suspend a running agent. Valid only from `running`.
    pub async fn pause(&self) -> Result<(), SupervisorError> {
        self.apply_transition(Transition::Pause).await?;
        self.emit_state_change(None).await;
        Ok(())
    }

    /// Resume a paused agent. Valid only from `paused`.
    pub async fn resume(&self) -> Result<(), SupervisorError> {
        self.apply_transition(Transition::Resume).await?;
        self.emit_state_change(None).await;
        Ok(())
    }

    /// Request a cooperative stop. A no-op from `pending`; otherwise
    /// deregisters the worker (letting any in-flight `execute` run to
    /// completion) and transitions to `stopped`.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        if self.state().await == SupervisorState::Pending {
            return Ok(());
        }
        self.apply_transition(Transition::Stop).await?;
        self.relay.deregister_agent(&self.id).await;
        self.emit_state_change(Some("stop".into())).await;
        Ok(())
    }

    /// Terminate the worker immediately and dispose the sandbox. Idempotent
    /// from every state, including an already-killed supervisor.
    pub async fn kill(&self) {
        {
            let mut state = self.state.write().await;
            *state = state.apply(Transition::Kill).expect("kill is valid from every state");
        }
        self.relay.kill_agent(&self.id).await;
        self.emit_state_change(Some("kill".into())).await;
    }

    /// Reset to `pending` from `stopped`, `killed`, or `error`, clearing
    /// the budget and subworker registry. Rejected from any other state,
    /// in particular `pending` itself.
    pub async fn restart(&self) -> Result<(), SupervisorError> {
        self.apply_transition(Transition::Restart).await?;
        *self.budget.write().await = BudgetAccumulator::new();
        *self.subworkers.write().await = SubworkerRegistry::new();
        self.emit_state_change(Some("restart".into())).await;
        Ok(())
    }

    /// Report that the upstream model emitted a `usage` event, folding it
    /// into the budget accumulator. If the agent's configured token or cost
    /// budget is now exceeded, transitions to `stopped` with a terminal
    /// error and returns [`SupervisorError::BudgetExhausted`].
    pub async fn record_usage(&self, input_tokens: u64, output_tokens: u64, cost: rust_decimal::Decimal) -> Result<(), SupervisorError> {
        let (token_budget, cost_budget) = {
            let config = self.config.read().await;
            (config.token_budget, config.cost_budget_usd)
        };
        let outcome = self
            .budget
            .write()
            .await
            .record_usage(input_tokens, output_tokens, cost, token_budget, cost_budget);

        if outcome == BudgetOutcome::Exceeded {
            *self.state.write().await = SupervisorState::Stopped;
            self.relay.deregister_agent(&self.id).await;
            self.emit_state_change(Some("budget".into())).await;
            return Err(SupervisorError::BudgetExhausted(self.id.to_string()));
        }
        Ok(())
    }

    /// Merge a partial config update and fan it out to the running worker
    /// as a `config_update` signal. Permission and network-policy changes
    /// only take effect on the next sandbox recreation (`restart`).
    pub async fn update_config(&self, update: ConfigUpdate) -> Result<(), SupervisorError> {
        let view_state = {
            let mut config = self.config.write().await;
            config.apply_update(update.clone());
            config.view_state.clone()
        };

        if self.state().await == SupervisorState::Running {
            let payload = SignalPayload::new("config_update", serde_json::to_value(&update).unwrap_or(Value::Null));
            self.relay.signal(&self.workflow, payload).await?;
        }

        let _ = self.events.send(AgentEvent::ViewStateChange { agent: self.id.clone(), view_state });
        Ok(())
    }

    /// Request a DOM/listener snapshot from the sandbox. `None` unless the
    /// agent is currently `running`.
    pub async fn capture_dom_state(&self) -> Result<Option<Value>, SupervisorError> {
        if self.state().await != SupervisorState::Running {
            return Ok(None);
        }
        let value = self.relay.query(&self.workflow, RelayQuery::new("dom_snapshot", Value::Null)).await?;
        Ok(Some(value))
    }

    /// Mark this agent as visible in the surrounding UI pane, forwarding a
    /// `visibility_change` event to its workers so they can pause
    /// animation-like work while hidden.
    pub async fn show_in_pane(&self) {
        self.set_visibility(true).await;
    }

    /// Mark this agent as hidden from the surrounding UI pane.
    pub async fn hide_from_pane(&self) {
        self.set_visibility(false).await;
    }

    async fn set_visibility(&self, visible: bool) {
        *self.visible.write().await = visible;
        let _ = self.events.send(AgentEvent::VisibilityChange { agent: self.id.clone(), visible });
        if self.state().await == SupervisorState::Running {
            let payload = SignalPayload::new("visibility_change", serde_json::json!({ "visible": visible }));
            let _ = self.relay.signal(&self.workflow, payload).await;
        }
    }

    /// Whether this agent is currently shown in the UI pane.
    pub async fn is_visible(&self) -> bool {
        *self.visible.read().await
    }

    /// Record a newly spawned subworker. Relaying the actual spawn command
    /// into the sandbox is the caller's responsibility; this records the
    /// registry entry.
    pub async fn spawn_subworker(&self, id: SubworkerId, config: SubworkerConfig, now: DateTime<Utc>) {
        self.subworkers.write().await.spawn(id, config, now);
    }

    /// Apply a lifecycle transition to a registered subworker.
    pub async fn transition_subworker(&self, id: &SubworkerId, transition: Transition) -> Result<SupervisorState, SupervisorError> {
        Ok(self.subworkers.write().await.transition(id, transition)?)
    }

    /// Remove a subworker from the registry (the terminal step of killing it).
    pub async fn remove_subworker(&self, id: &SubworkerId) {
        self.subworkers.write().await.remove(id);
    }

    /// How many subworkers are currently registered.
    pub async fn subworker_count(&self) -> usize {
        self.subworkers.read().await.len()
    }
}
