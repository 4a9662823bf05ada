//! The six-state supervisor lifecycle and its transition table.
//!
//! Table-driven rather than a conditional cascade, same reasoning as
//! [`crate::router`]'s capability table: the set of valid transitions is
//! fixed ahead of time, so a bad request is rejected by lookup instead of
//! by an `if` that might drift from the next one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six lifecycle states an [`crate::supervisor::AgentSupervisor`] occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    /// Configured but not yet started; the initial state.
    Pending,
    /// A sandbox document and main worker are live.
    Running,
    /// Running, but workers have been told to suspend.
    Paused,
    /// Stopped cooperatively; the sandbox document has been disposed.
    Stopped,
    /// A worker raised an unhandled error; requires `restart` to recover.
    Error,
    /// Killed immediately; the sandbox document was torn down without
    /// waiting for in-flight work.
    Killed,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorState::Pending => "pending",
            SupervisorState::Running => "running",
            SupervisorState::Paused => "paused",
            SupervisorState::Stopped => "stopped",
            SupervisorState::Error => "error",
            SupervisorState::Killed => "killed",
        };
        f.write_str(s)
    }
}

/// One lifecycle operation a supervisor can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `pending → running`.
    Start,
    /// `running → paused`.
    Pause,
    /// `paused → running`.
    Resume,
    /// `running | paused → stopped`.
    Stop,
    /// Any state `→ killed`. Idempotent: killing an already-killed
    /// supervisor is accepted, not rejected.
    Kill,
    /// `stopped | killed | error → pending`.
    Restart,
}

/// A transition was requested from a state that does not permit it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {transition:?} from {from}")]
pub struct InvalidTransition {
    /// The state the supervisor was in.
    pub from: SupervisorState,
    /// The transition that was rejected.
    pub transition: Transition,
}

impl SupervisorState {
    /// Resolve the state after applying `transition`, or reject it.
    ///
    /// `kill` is idempotent from every state including `killed` itself.
    /// Every other transition is rejected outside its one listed edge —
    /// in particular `restart` from `pending` is explicitly an error, not
    /// a no-op, per the lifecycle design.
    pub fn apply(self, transition: Transition) -> Result<SupervisorState, InvalidTransition> {
        use SupervisorState::*;
        use Transition::*;

        let reject = || Err(InvalidTransition { from: self, transition });

        match (self, transition) {
            (Pending, Start) => Ok(Running),
            (Running, Pause) => Ok(Paused),
            (Paused, Resume) => Ok(Running),
            (Running, Stop) | (Paused, Stop) => Ok(Stopped),
            (_, Kill) => Ok(Killed),
            (Stopped, Restart) | (Killed, Restart) | (Error, Restart) => Ok(Pending),
            _ => reject(),
        }
    }
}
