//! The command envelope sent down one worker's channel.
//!
//! Each worker owns exactly one [`tokio::sync::mpsc`] receiver, drained by a
//! single spawned task — this is what gives a worker its FIFO ordering
//! guarantee: nothing else executes against that worker's `Operator` while a
//! prior command is in flight, because the task processes its channel one
//! message at a time.

use flo_core::effect::SignalPayload;
use flo_core::operator::{OperatorError, OperatorInput, OperatorOutput};
use flo_core::relay::{RelayError, RelayQuery};
use serde_json::Value;
use tokio::sync::oneshot;

/// One unit of work sent to a worker's draining task.
pub enum WorkerCommand {
    /// Run the operator against this input and report the result back.
    Execute {
        /// The invocation to run.
        input: OperatorInput,
        /// Where to send the result.
        reply: oneshot::Sender<Result<OperatorOutput, OperatorError>>,
    },
    /// Deliver a fire-and-forget signal. No reply is awaited by the caller
    /// beyond "accepted into the queue" (the `Relay::signal` contract).
    Signal {
        /// The signal payload.
        payload: SignalPayload,
    },
    /// Ask the worker to answer a query about its own running state.
    Query {
        /// The query itself.
        query: RelayQuery,
        /// Where to send the answer.
        reply: oneshot::Sender<Result<Value, RelayError>>,
    },
}
