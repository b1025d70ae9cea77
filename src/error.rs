//! # Error types used by the supervisor runtime and workers.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`] errors raised by the orchestration runtime itself.
//! - [`WorkerError`] errors raised by individual worker executions.
//!
//! Both types provide an `as_label` helper that returns a short stable
//! snake_case tag for logs and metrics.

use std::time::Duration;

use thiserror::Error;

use crate::workers::{WorkerName, WorkerState};

/// # Errors produced by the supervision runtime.
///
/// These represent failures in the orchestration system itself,
/// not in the supervised workers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A worker lifecycle transition that is not declared in the state machine.
    #[error("invalid transition: {from} --> {to}")]
    InvalidTransition {
        /// State the worker was in.
        from: WorkerState,
        /// State the caller tried to reach.
        to: WorkerState,
    },

    /// The named worker is not present in the pool.
    #[error("worker '{name}' is not registered")]
    NotRegistered {
        /// The missing worker name.
        name: WorkerName,
    },

    /// Registration was attempted with an empty worker name.
    #[error("worker name must not be empty")]
    EmptyWorkerName,

    /// `run` was called with an empty pool, or no registered worker could be started.
    #[error("unable to start: there is no runnable workers")]
    NoRunnableWorkers,

    /// The pool did not drain within the force-stop timeout after shutdown.
    #[error("graceful shutdown failed: force-stop timeout {timeout:?} exceeded")]
    GraceExceeded {
        /// The configured force-stop timeout.
        timeout: Duration,
    },

    /// The management socket could not be served.
    #[error("service socket failed: {0}")]
    Socket(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidTransition { .. } => "runtime_invalid_transition",
            RuntimeError::NotRegistered { .. } => "runtime_worker_not_registered",
            RuntimeError::EmptyWorkerName => "runtime_empty_worker_name",
            RuntimeError::NoRunnableWorkers => "runtime_no_runnable_workers",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Socket(_) => "runtime_socket_failed",
        }
    }
}

/// # Errors produced by worker execution.
///
/// These represent failures of individual async workers managed by the
/// runtime. Whether a failed worker is re-run is decided by its
/// [`RestartPolicy`](crate::workers::RestartPolicy), not by the error value.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The worker could not complete its initialization.
    #[error("init failed: {reason}")]
    InitFailed { reason: String },

    /// The worker run loop returned a failure.
    #[error("execution failed: {reason}")]
    Fail { reason: String },
}

impl WorkerError {
    /// Shorthand for [`WorkerError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        WorkerError::Fail {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`WorkerError::InitFailed`].
    pub fn init(reason: impl Into<String>) -> Self {
        WorkerError::InitFailed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::InitFailed { .. } => "worker_init_failed",
            WorkerError::Fail { .. } => "worker_failed",
        }
    }
}
