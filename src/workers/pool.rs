//! # Worker pool: runtime records and the per-worker execution loop.
//!
//! The pool owns one record per registered worker (capability object,
//! lifecycle state machine, restart policy, cancellation handle) and
//! drives each worker through its whole lifecycle in
//! [`WorkerPool::execute`].
//!
//! ## Execution loop
//! ```text
//! loop:
//!   -> Initialized, init() if due
//!        init error: fatal event, -> Failed,
//!                    escalate / retry with re-init / give up
//!   -> Running, run(ctx) guarded against panics
//!        ok:     -> Stopped, done
//!        error:  -> Failed, error event
//!        panic:  -> Failed, error event with stack trace
//!   StopAppOnFail wins over restart flags;
//!   cancellation is checked after failure classification,
//!   so a worker failing during shutdown is never restarted.
//! ```
//!
//! ## Locking
//! The name-to-record map sits behind a reader/writer lock: registration
//! and state transitions take the write lock, snapshots the read lock.
//! State machines are only ever touched under the write lock.

use std::backtrace::Backtrace;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::context::WorkerContext;
use crate::error::RuntimeError;
use crate::events::{Event, EventBus};
use crate::workers::policy::RestartPolicy;
use crate::workers::state::{StateMachine, WorkerState};
use crate::workers::worker::{WorkerName, WorkerRef};

/// Why one worker's execution loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitReason {
    /// The worker reached `Stopped`.
    Completed,
    /// Terminal failure; the policy forbids (further) restarts.
    Failed,
    /// Bookkeeping fault (missing record, undeclared transition); the
    /// worker's execution was abandoned.
    Abandoned,
    /// `StopAppOnFail` fired; the supervisor must shut the application down.
    Escalated,
}

/// One registered worker.
struct WorkerRecord {
    worker: WorkerRef,
    state: StateMachine,
    policy: RestartPolicy,
    /// Cancellation handle of the running execution, set at start.
    #[allow(dead_code)]
    cancel: Option<CancellationToken>,
}

/// Concurrency-safe name-to-record mapping.
pub(crate) struct WorkerPool {
    workers: RwLock<HashMap<WorkerName, WorkerRecord>>,
}

impl WorkerPool {
    pub(crate) fn new() -> Self {
        Self {
            workers: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a record with a fresh state machine in `New`.
    ///
    /// A later registration under the same name overwrites the earlier
    /// one; the supervisor rejects post-start registration before it gets
    /// here.
    pub(crate) fn register(
        &self,
        name: WorkerName,
        worker: WorkerRef,
        policy: RestartPolicy,
    ) -> Result<(), RuntimeError> {
        if name.is_empty() {
            return Err(RuntimeError::EmptyWorkerName);
        }
        self.workers.write().insert(
            name,
            WorkerRecord {
                worker,
                state: StateMachine::new(),
                policy,
                cancel: None,
            },
        );
        Ok(())
    }

    /// Registered names, sorted for a deterministic start order.
    pub(crate) fn names(&self) -> Vec<WorkerName> {
        let mut names: Vec<WorkerName> = self.workers.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn len(&self) -> usize {
        self.workers.read().len()
    }

    /// Copies out the current state of every worker.
    pub(crate) fn snapshot(&self) -> BTreeMap<WorkerName, WorkerState> {
        self.workers
            .read()
            .iter()
            .map(|(name, record)| (name.clone(), record.state.current()))
            .collect()
    }

    /// Stores the cancellation handle of a freshly started execution.
    pub(crate) fn set_cancel(&self, name: &WorkerName, token: CancellationToken) {
        if let Some(record) = self.workers.write().get_mut(name) {
            record.cancel = Some(token);
        }
    }

    /// Drives one worker through one full lifecycle, with retries per its
    /// restart policy, and returns once the worker reached a
    /// terminal-for-this-invocation condition.
    ///
    /// All observable outcomes are reported through `events`; the caller
    /// only acts on [`ExitReason::Escalated`].
    pub(crate) async fn execute(
        &self,
        name: &WorkerName,
        ctx: WorkerContext,
        events: &EventBus,
    ) -> ExitReason {
        let (worker, policy) = match self.entry(name) {
            Some(pair) => pair,
            None => {
                let err = RuntimeError::NotRegistered { name: name.clone() };
                return self.abandon(name, err, events).await;
            }
        };
        let triggers = policy.triggers();
        let mut with_init = true;

        loop {
            if with_init {
                if let Err(err) = self.transition(name, WorkerState::Initialized) {
                    return self.abandon(name, err, events).await;
                }
                if let Err(err) = worker.init().await {
                    events
                        .emit(
                            Event::fatal("worker init failed")
                                .with_worker(name)
                                .with_field("error", err.to_string()),
                        )
                        .await;
                    if let Err(err) = self.transition(name, WorkerState::Failed) {
                        return self.abandon(name, err, events).await;
                    }
                    if policy.stops_app() {
                        return self.escalate(name, events).await;
                    }
                    // A retried init always runs init again: there is no
                    // initialized state to resume from.
                    if triggers.on_error && !ctx.is_cancelled() {
                        continue;
                    }
                    return ExitReason::Failed;
                }
                events.emit(Event::info("initialized").with_worker(name)).await;
            }

            if let Err(err) = self.transition(name, WorkerState::Running) {
                return self.abandon(name, err, events).await;
            }
            events.emit(Event::info("starting").with_worker(name)).await;

            let outcome = AssertUnwindSafe(worker.run(ctx.clone())).catch_unwind().await;

            let panicked = match outcome {
                Ok(Ok(())) => {
                    if let Err(err) = self.transition(name, WorkerState::Stopped) {
                        return self.abandon(name, err, events).await;
                    }
                    events.emit(Event::info("stopped").with_worker(name)).await;
                    return ExitReason::Completed;
                }
                Ok(Err(err)) => {
                    if let Err(terr) = self.transition(name, WorkerState::Failed) {
                        return self.abandon(name, terr, events).await;
                    }
                    events
                        .emit(
                            Event::error("worker failed")
                                .with_worker(name)
                                .with_field("error", err.to_string()),
                        )
                        .await;
                    false
                }
                Err(panic) => {
                    if let Err(terr) = self.transition(name, WorkerState::Failed) {
                        return self.abandon(name, terr, events).await;
                    }
                    let stack = Backtrace::force_capture().to_string();
                    events
                        .emit(
                            Event::error("caught panic")
                                .with_worker(name)
                                .with_field("error", panic_message(&panic))
                                .with_field("stack", stack),
                        )
                        .await;
                    true
                }
            };

            // StopAppOnFail wins over the restart flags.
            if policy.stops_app() {
                return self.escalate(name, events).await;
            }
            let restartable = if panicked {
                triggers.on_panic
            } else {
                triggers.on_error
            };
            if !restartable {
                return ExitReason::Failed;
            }
            // A failure during shutdown is never restarted.
            if ctx.is_cancelled() {
                return ExitReason::Failed;
            }
            with_init = triggers.with_reinit;
        }
    }

    fn entry(&self, name: &WorkerName) -> Option<(WorkerRef, RestartPolicy)> {
        self.workers
            .read()
            .get(name)
            .map(|record| (Arc::clone(&record.worker), record.policy))
    }

    fn transition(&self, name: &WorkerName, to: WorkerState) -> Result<(), RuntimeError> {
        let mut workers = self.workers.write();
        let record = workers
            .get_mut(name)
            .ok_or_else(|| RuntimeError::NotRegistered { name: name.clone() })?;
        record.state.transition(to)
    }

    async fn abandon(
        &self,
        name: &WorkerName,
        err: RuntimeError,
        events: &EventBus,
    ) -> ExitReason {
        events
            .emit(Event::error(err.to_string()).with_worker(name))
            .await;
        ExitReason::Abandoned
    }

    async fn escalate(&self, name: &WorkerName, events: &EventBus) -> ExitReason {
        events
            .emit(
                Event::fatal("stopping application: worker failure escalated")
                    .with_worker(name),
            )
            .await;
        ExitReason::Escalated
    }
}

/// Coerces a caught panic payload to a string.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
