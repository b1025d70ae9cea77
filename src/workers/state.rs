//! # Worker lifecycle states and the per-worker state machine.
//!
//! Every registered worker is tracked by a [`StateMachine`] that accepts
//! only the declared lifecycle transitions:
//!
//! ```text
//! (*) -> [New] -> [Initialized] -> [Running] -> [Stopped]
//!          |             |             |
//!          |             |             v
//!          |-------------+-------> [Failed]
//!                                (from [Failed] a restartable worker
//!                                 goes back to [Initialized] or [Running])
//! ```
//!
//! [`WorkerState::Stopped`] is terminal. The machine itself is not
//! thread-safe; the pool serializes access under its lock.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;

/// Lifecycle state of a single worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerState {
    /// Registered but not yet touched by the runtime.
    New,
    /// `init` completed (or is about to run after a re-init restart).
    Initialized,
    /// `run` is in flight.
    Running,
    /// `run` returned cleanly. Terminal.
    Stopped,
    /// `init` or `run` failed, or `run` panicked.
    Failed,
}

impl WorkerState {
    /// Stable string form, also used by the management socket.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::New => "New",
            WorkerState::Initialized => "Initialized",
            WorkerState::Running => "Running",
            WorkerState::Stopped => "Stopped",
            WorkerState::Failed => "Failed",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validating state machine for one worker lifecycle.
///
/// [`StateMachine::transition`] succeeds only for declared edges; any other
/// request is a programmer error reported as
/// [`RuntimeError::InvalidTransition`] naming both states. The current
/// state can always be read without mutation via [`StateMachine::current`].
#[derive(Clone, Debug)]
pub struct StateMachine {
    current: WorkerState,
}

impl StateMachine {
    /// Creates a machine in [`WorkerState::New`].
    pub fn new() -> Self {
        Self {
            current: WorkerState::New,
        }
    }

    /// Returns the current state without mutation.
    pub fn current(&self) -> WorkerState {
        self.current
    }

    /// Moves the machine to `to` if the edge is declared.
    pub fn transition(&mut self, to: WorkerState) -> Result<(), RuntimeError> {
        if !Self::declared(self.current, to) {
            return Err(RuntimeError::InvalidTransition {
                from: self.current,
                to,
            });
        }
        self.current = to;
        Ok(())
    }

    fn declared(from: WorkerState, to: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (from, to),
            (New, Initialized)
                | (New, Failed)
                | (Initialized, Running)
                | (Initialized, Failed)
                | (Running, Stopped)
                | (Running, Failed)
                | (Failed, Initialized)
                | (Failed, Running)
        )
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_lifecycle() {
        let mut sm = StateMachine::new();
        assert_eq!(sm.current(), WorkerState::New);
        sm.transition(WorkerState::Initialized).unwrap();
        sm.transition(WorkerState::Running).unwrap();
        sm.transition(WorkerState::Stopped).unwrap();
        assert_eq!(sm.current(), WorkerState::Stopped);
    }

    #[test]
    fn restart_paths_from_failed() {
        let mut sm = StateMachine::new();
        sm.transition(WorkerState::Initialized).unwrap();
        sm.transition(WorkerState::Running).unwrap();
        sm.transition(WorkerState::Failed).unwrap();
        // restart with re-init
        sm.transition(WorkerState::Initialized).unwrap();
        sm.transition(WorkerState::Running).unwrap();
        sm.transition(WorkerState::Failed).unwrap();
        // restart without re-init
        sm.transition(WorkerState::Running).unwrap();
        sm.transition(WorkerState::Stopped).unwrap();
    }

    #[test]
    fn init_failure_path() {
        let mut sm = StateMachine::new();
        sm.transition(WorkerState::Initialized).unwrap();
        sm.transition(WorkerState::Failed).unwrap();
        sm.transition(WorkerState::Initialized).unwrap();
        assert_eq!(sm.current(), WorkerState::Initialized);
    }

    #[test]
    fn undeclared_edges_are_rejected() {
        let mut sm = StateMachine::new();
        let err = sm.transition(WorkerState::Running).unwrap_err();
        assert_eq!(err.to_string(), "invalid transition: New --> Running");
        // the failed attempt must not move the machine
        assert_eq!(sm.current(), WorkerState::New);
    }

    #[test]
    fn stopped_is_terminal() {
        let mut sm = StateMachine::new();
        sm.transition(WorkerState::Initialized).unwrap();
        sm.transition(WorkerState::Running).unwrap();
        sm.transition(WorkerState::Stopped).unwrap();
        assert!(sm.transition(WorkerState::Running).is_err());
        assert!(sm.transition(WorkerState::Failed).is_err());
        assert!(sm.transition(WorkerState::Initialized).is_err());
    }
}
