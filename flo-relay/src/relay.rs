//! The in-process implementation of [`flo_core::relay::Relay`].
//!
//! Each registered worker gets one spawned task owning its `Operator` and
//! draining a bounded [`tokio::sync::mpsc`] channel — this is the "single
//! task per worker, single channel drain" shape the concurrency model calls
//! for: commands queued against the same worker execute strictly in the
//! order they were sent, and two different workers make progress fully
//! concurrently. `dispatch_many` fans out across workers with
//! `futures::future::join_all`, so one worker stalling never blocks another.

use crate::message::WorkerCommand;
use async_trait::async_trait;
use flo_core::effect::SignalPayload;
use flo_core::id::{AgentId, WorkflowId};
use flo_core::operator::{Operator, OperatorInput, OperatorOutput};
use flo_core::relay::{Relay, RelayError, RelayQuery};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};

/// Answers a [`RelayQuery`] against a worker's live state.
///
/// Kept separate from [`Operator`] because a query (e.g. `dom_snapshot`) asks
/// about state the loop accumulates between `execute` calls, not something
/// that itself drives another turn.
#[async_trait]
pub trait QueryHandler: Send + Sync {
    /// Answer the given query.
    async fn handle(&self, query: RelayQuery) -> Result<Value, RelayError>;
}

/// A query handler that answers every query with [`RelayError::Other`],
/// naming the query type. The default for workers that don't expose any
/// queryable state.
pub struct NoQueries;

#[async_trait]
impl QueryHandler for NoQueries {
    async fn handle(&self, query: RelayQuery) -> Result<Value, RelayError> {
        Err(RelayError::Other(
            format!("no query handler registered (asked for {})", query.query_type).into(),
        ))
    }
}

/// A cloneable reference to a registered worker's command queue.
#[derive(Clone)]
struct WorkerHandle {
    sender: mpsc::Sender<WorkerCommand>,
}

/// Bound on each worker's command queue. Backpressure, not data loss: a send
/// blocks the caller rather than dropping a command once a worker falls this
/// far behind.
const WORKER_QUEUE_DEPTH: usize = 64;

/// The in-process relay: every worker is a spawned task reachable by
/// [`AgentId`], every running workflow reachable by [`WorkflowId`] once it
/// has announced itself (an agent may run several workflows over its
/// lifetime; only the most recently announced handle is addressable).
#[derive(Default)]
pub struct InProcessRelay {
    agents: RwLock<HashMap<AgentId, WorkerHandle>>,
    workflows: RwLock<HashMap<WorkflowId, WorkerHandle>>,
    join_handles: Mutex<Vec<tokio::task::JoinHandle<()>>>,
    abort_handles: RwLock<HashMap<AgentId, tokio::task::AbortHandle>>,
}

impl InProcessRelay {
    /// Build an empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker under `agent`, with no queryable state.
    pub async fn register_agent(&self, agent: AgentId, operator: Arc<dyn Operator>) {
        self.register_agent_with_queries(agent, operator, Arc::new(NoQueries)).await;
    }

    /// Register a worker under `agent`, answering queries via `queries`.
    pub async fn register_agent_with_queries(
        &self,
        agent: AgentId,
        operator: Arc<dyn Operator>,
        queries: Arc<dyn QueryHandler>,
    ) {
        let (tx, rx) = mpsc::channel(WORKER_QUEUE_DEPTH);
        let handle = WorkerHandle { sender: tx };
        let join = tokio::spawn(Self::drain(rx, operator, queries));
        self.abort_handles.write().await.insert(agent.clone(), join.abort_handle());
        self.agents.write().await.insert(agent, handle.clone());
        self.join_handles.lock().await.push(join);
    }

    /// Announce that `workflow` is now running on the worker registered
    /// under `agent`, making it addressable by [`Relay::signal`] and
    /// [`Relay::query`].
    pub async fn announce_workflow(&self, workflow: WorkflowId, agent: &AgentId) -> Result<(), RelayError> {
        let handle = self
            .agents
            .read()
            .await
            .get(agent)
            .cloned()
            .ok_or_else(|| RelayError::AgentNotFound(agent.to_string()))?;
        self.workflows.write().await.insert(workflow, handle);
        Ok(())
    }

    /// Deregister a worker. Dropping its command sender lets the draining
    /// task exit once its queue empties (cooperative — an in-flight
    /// `execute` call still runs to completion).
    pub async fn deregister_agent(&self, agent: &AgentId) {
        self.agents.write().await.remove(agent);
        self.abort_handles.write().await.remove(agent);
    }

    /// Immediately terminate a worker's draining task, aborting any
    /// in-flight `Operator::execute` call. Backs `AgentSupervisor::kill`,
    /// which per the lifecycle design disposes the sandbox "immediately"
    /// rather than waiting for the current tool to finish. Idempotent:
    /// aborting an already-removed or already-aborted agent is a no-op.
    pub async fn kill_agent(&self, agent: &AgentId) -> bool {
        self.agents.write().await.remove(agent);
        match self.abort_handles.write().await.remove(agent) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    async fn drain(
        mut rx: mpsc::Receiver<WorkerCommand>,
        operator: Arc<dyn Operator>,
        queries: Arc<dyn QueryHandler>,
    ) {
        while let Some(command) = rx.recv().await {
            match command {
                WorkerCommand::Execute { input, reply } => {
                    let result = operator.execute(input).await;
                    let _ = reply.send(result);
                }
                WorkerCommand::Signal { payload } => {
                    // Fire-and-forget: the Relay::signal contract is
                    // "accepted", not "processed". A worker with no signal
                    // inbox of its own simply drops it here; a real loop
                    // implementation would fold this into its next turn.
                    drop(payload);
                }
                WorkerCommand::Query { query, reply } => {
                    let result = queries.handle(query).await;
                    let _ = reply.send(result);
                }
            }
        }
    }

    async fn handle_of_agent(&self, agent: &AgentId) -> Result<WorkerHandle, RelayError> {
        self.agents
            .read()
            .await
            .get(agent)
            .cloned()
            .ok_or_else(|| RelayError::AgentNotFound(agent.to_string()))
    }

    async fn handle_of_workflow(&self, workflow: &WorkflowId) -> Result<WorkerHandle, RelayError> {
        self.workflows
            .read()
            .await
            .get(workflow)
            .cloned()
            .ok_or_else(|| RelayError::WorkflowNotFound(workflow.to_string()))
    }
}

#[async_trait]
impl Relay for InProcessRelay {
    async fn dispatch(
        &self,
        agent: &AgentId,
        input: OperatorInput,
    ) -> Result<OperatorOutput, RelayError> {
        let handle = self.handle_of_agent(agent).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .sender
            .send(WorkerCommand::Execute { input, reply: tx })
            .await
            .map_err(|_| RelayError::DispatchFailed(format!("worker {agent} is no longer accepting work")))?;
        rx.await
            .map_err(|_| RelayError::DispatchFailed(format!("worker {agent} dropped its reply channel")))?
            .map_err(RelayError::from)
    }

    async fn dispatch_many(
        &self,
        tasks: Vec<(AgentId, OperatorInput)>,
    ) -> Vec<Result<OperatorOutput, RelayError>> {
        let futures = tasks.into_iter().map(|(agent, input)| async move {
            self.dispatch(&agent, input).await
        });
        futures::future::join_all(futures).await
    }

    async fn signal(&self, target: &WorkflowId, signal: SignalPayload) -> Result<(), RelayError> {
        let handle = self.handle_of_workflow(target).await?;
        handle
            .sender
            .send(WorkerCommand::Signal { payload: signal })
            .await
            .map_err(|_| RelayError::SignalFailed(format!("workflow {target} is no longer accepting signals")))
    }

    async fn query(&self, target: &WorkflowId, query: RelayQuery) -> Result<Value, RelayError> {
        let handle = self.handle_of_workflow(target).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .sender
            .send(WorkerCommand::Query { query, reply: tx })
            .await
            .map_err(|_| RelayError::DispatchFailed(format!("workflow {target} is no longer accepting queries")))?;
        rx.await
            .map_err(|_| RelayError::DispatchFailed(format!("workflow {target} dropped its reply channel")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flo_core::content::Message;
    use flo_core::operator::{ExitReason, OperatorMetadata, TriggerType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoOperator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Operator for EchoOperator {
        async fn execute(
            &self,
            input: OperatorInput,
        ) -> Result<OperatorOutput, flo_core::operator::OperatorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OperatorOutput::new(
                input.message,
                ExitReason::Complete,
                OperatorMetadata::default(),
            ))
        }
    }

    #[tokio::test]
    async fn dispatch_routes_to_the_registered_worker() {
        let relay = InProcessRelay::new();
        let agent = AgentId::new("a1");
        relay
            .register_agent(agent.clone(), Arc::new(EchoOperator { calls: AtomicUsize::new(0) }))
            .await;

        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let output = relay.dispatch(&agent, input).await.unwrap();
        assert_eq!(output.message.content.len(), Message::user("hi").content.len());
    }

    #[tokio::test]
    async fn dispatch_to_unknown_agent_is_agent_not_found() {
        let relay = InProcessRelay::new();
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let err = relay.dispatch(&AgentId::new("ghost"), input).await.unwrap_err();
        assert!(matches!(err, RelayError::AgentNotFound(_)));
    }

    #[tokio::test]
    async fn dispatch_many_preserves_input_order() {
        let relay = InProcessRelay::new();
        for i in 0..3 {
            relay
                .register_agent(
                    AgentId::new(format!("a{i}")),
                    Arc::new(EchoOperator { calls: AtomicUsize::new(0) }),
                )
                .await;
        }
        let tasks = vec![
            (AgentId::new("a0"), OperatorInput::new(Message::user("0"), TriggerType::User)),
            (AgentId::new("a1"), OperatorInput::new(Message::user("1"), TriggerType::User)),
            (AgentId::new("a2"), OperatorInput::new(Message::user("2"), TriggerType::User)),
        ];
        let results = relay.dispatch_many(tasks).await;
        assert_eq!(results.len(), 3);
        for r in results {
            assert!(r.is_ok());
        }
    }

    #[tokio::test]
    async fn one_failing_dispatch_does_not_cancel_the_others() {
        let relay = InProcessRelay::new();
        relay
            .register_agent(AgentId::new("ok"), Arc::new(EchoOperator { calls: AtomicUsize::new(0) }))
            .await;
        let tasks = vec![
            (AgentId::new("ghost"), OperatorInput::new(Message::user("x"), TriggerType::User)),
            (AgentId::new("ok"), OperatorInput::new(Message::user("y"), TriggerType::User)),
        ];
        let results = relay.dispatch_many(tasks).await;
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[tokio::test]
    async fn signal_requires_an_announced_workflow() {
        let relay = InProcessRelay::new();
        let err = relay
            .signal(&WorkflowId::new("wf1"), SignalPayload::new("ping", Value::Null))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::WorkflowNotFound(_)));
    }

    #[tokio::test]
    async fn signal_succeeds_once_the_workflow_is_announced() {
        let relay = InProcessRelay::new();
        let agent = AgentId::new("a1");
        relay
            .register_agent(agent.clone(), Arc::new(EchoOperator { calls: AtomicUsize::new(0) }))
            .await;
        let workflow = WorkflowId::new("wf1");
        relay.announce_workflow(workflow.clone(), &agent).await.unwrap();
        relay.signal(&workflow, SignalPayload::new("ping", Value::Null)).await.unwrap();
    }

    #[tokio::test]
    async fn query_with_no_handler_reports_the_query_type() {
        let relay = InProcessRelay::new();
        let agent = AgentId::new("a1");
        relay
            .register_agent(agent.clone(), Arc::new(EchoOperator { calls: AtomicUsize::new(0) }))
            .await;
        let workflow = WorkflowId::new("wf1");
        relay.announce_workflow(workflow.clone(), &agent).await.unwrap();
        let err = relay
            .query(&workflow, RelayQuery::new("dom_snapshot", Value::Null))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dom_snapshot"));
    }

    struct EchoQueries;
    #[async_trait]
    impl QueryHandler for EchoQueries {
        async fn handle(&self, query: RelayQuery) -> Result<Value, RelayError> {
            Ok(query.params)
        }
    }

    #[tokio::test]
    async fn query_with_handler_returns_its_answer() {
        let relay = InProcessRelay::new();
        let agent = AgentId::new("a1");
        relay
            .register_agent_with_queries(
                agent.clone(),
                Arc::new(EchoOperator { calls: AtomicUsize::new(0) }),
                Arc::new(EchoQueries),
            )
            .await;
        let workflow = WorkflowId::new("wf1");
        relay.announce_workflow(workflow.clone(), &agent).await.unwrap();
        let answer = relay
            .query(&workflow, RelayQuery::new("echo", serde_json::json!({"x": 1})))
            .await
            .unwrap();
        assert_eq!(answer["x"], 1);
    }

    #[tokio::test]
    async fn deregistering_an_agent_makes_further_dispatch_fail() {
        let relay = InProcessRelay::new();
        let agent = AgentId::new("a1");
        relay
            .register_agent(agent.clone(), Arc::new(EchoOperator { calls: AtomicUsize::new(0) }))
            .await;
        relay.deregister_agent(&agent).await;
        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let err = relay.dispatch(&agent, input).await.unwrap_err();
        assert!(matches!(err, RelayError::AgentNotFound(_)));
    }

    struct BlockingOperator;

    #[async_trait]
    impl Operator for BlockingOperator {
        async fn execute(
            &self,
            _input: OperatorInput,
        ) -> Result<OperatorOutput, flo_core::operator::OperatorError> {
            futures::future::pending::<()>().await;
            unreachable!("pending future never resolves")
        }
    }

    #[tokio::test]
    async fn kill_agent_aborts_an_in_flight_execute() {
        let relay = InProcessRelay::new();
        let agent = AgentId::new("a1");
        relay.register_agent(agent.clone(), Arc::new(BlockingOperator)).await;

        let input = OperatorInput::new(Message::user("hi"), TriggerType::User);
        let dispatch = {
            let relay = &relay;
            let agent = agent.clone();
            async move { relay.dispatch(&agent, input).await }
        };
        tokio::pin!(dispatch);

        // Give the worker task a chance to start executing before killing it.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(relay.kill_agent(&agent).await);

        let result = dispatch.await;
        assert!(result.is_err(), "an aborted worker must not resolve successfully");
    }

    #[tokio::test]
    async fn kill_agent_is_idempotent() {
        let relay = InProcessRelay::new();
        let agent = AgentId::new("a1");
        relay
            .register_agent(agent.clone(), Arc::new(EchoOperator { calls: AtomicUsize::new(0) }))
            .await;
        assert!(relay.kill_agent(&agent).await);
        assert!(!relay.kill_agent(&agent).await);
    }
}
