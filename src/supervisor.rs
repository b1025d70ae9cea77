//! # Supervisor: orchestrates workers, the broker, and graceful shutdown.
//!
//! The [`Supervisor`] sits at the top of the application's execution
//! stack. It owns the worker pool, the message broker, the optional
//! management socket, and the event channel, and it blocks inside
//! [`Supervisor::run`] until the locker completes (by default: until the
//! process receives a stop signal), after which it shuts every worker
//! down gracefully.
//!
//! ## Architecture
//! ```text
//! add_worker()* ──► Supervisor::run()
//!                        │
//!                        ├──► event pump          (when a handler is set)
//!                        ├──► locker task ──► shutdown(): cancel + callback
//!                        │
//!                        ├──► broker dispatch task
//!                        ├──► one task per worker ──► pool.execute()
//!                        │         └──► events, restarts per policy
//!                        ├──► management socket   (when enabled)
//!                        │
//!                        └──► wait for locker, then race:
//!                              ├──► pool drained          → Ok
//!                              └──► force-stop timer wins → error event + Err
//! ```
//!
//! ## Rules
//! - Workers must be registered before `run`; later registrations are
//!   rejected with an error event.
//! - Exactly one event-delivery mode: either install a handler with
//!   [`Supervisor::set_event_handler`] or take the channel with
//!   [`Supervisor::events`]. Never both.
//! - A worker with `StopAppOnFail` escalates its failure: the supervisor
//!   cancels every worker and `run` returns after the drain.
//! - Shutdown is idempotent in effect; the shutdown callback runs once.
//!
//! ```rust,no_run
//! use foreman::{RestartPolicy, Supervisor, WorkerContext, WorkerError, WorkerFn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), foreman::RuntimeError> {
//!     let mut chief = Supervisor::new();
//!     chief.set_event_handler(foreman::tracing_handler());
//!     chief.add_worker(
//!         "ticker",
//!         WorkerFn::arc(|ctx: WorkerContext| async move {
//!             ctx.cancelled().await;
//!             Ok::<_, WorkerError>(())
//!         }),
//!         RestartPolicy::always(),
//!     );
//!     chief.run().await
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::SupervisorConfig;
use crate::context::WorkerContext;
use crate::error::RuntimeError;
use crate::events::{Event, EventBus, EventHandler};
use crate::health::{AppInfo, StateInfo, PING_ACTION, STATUS_ACTION};
use crate::mailbox::{Broker, MessageBroker, NopBroker};
use crate::signal;
use crate::socket::{Action, Response, SocketServer};
use crate::workers::{ExitReason, RestartPolicy, WorkerName, WorkerPool, WorkerRef, WorkerState};

/// Synthetic worker name used on management-socket failure events.
const SOCKET_WORKER: &str = "service_socket";

/// Cancels the root token and runs the shutdown callback exactly once.
struct ShutdownGate {
    root: CancellationToken,
    callback: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl ShutdownGate {
    fn new(root: CancellationToken) -> Self {
        Self {
            root,
            callback: Mutex::new(None),
        }
    }

    fn trigger(&self) {
        self.root.cancel();
        let callback = self.callback.lock().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Top-level coordinator of named long-running workers.
///
/// See the [module docs](self) for the run protocol.
pub struct Supervisor {
    config: SupervisorConfig,
    pool: Arc<WorkerPool>,
    root: CancellationToken,
    gate: Arc<ShutdownGate>,
    locker: Option<BoxFuture<'static, ()>>,
    broker: Option<Box<dyn MessageBroker>>,
    socket: Option<SocketServer>,
    events: EventBus,
    event_rx: Option<mpsc::Receiver<Event>>,
    event_handler: Option<EventHandler>,
    started: bool,
}

impl Supervisor {
    /// Creates a supervisor with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SupervisorConfig::default())
    }

    /// Creates a supervisor with an explicit configuration.
    pub fn with_config(config: SupervisorConfig) -> Self {
        let (events, event_rx) = EventBus::new(config.event_capacity);
        let root = CancellationToken::new();
        let gate = Arc::new(ShutdownGate::new(root.clone()));
        Self {
            config,
            pool: Arc::new(WorkerPool::new()),
            root,
            gate,
            locker: None,
            broker: None,
            socket: None,
            events,
            event_rx: Some(event_rx),
            event_handler: None,
            started: false,
        }
    }

    /// Registers a worker in the pool.
    ///
    /// Registration faults (empty name, supervisor already started) are
    /// reported as error events tagged with the worker name; the worker
    /// is then left out of the started set.
    pub fn add_worker(
        &mut self,
        name: impl Into<WorkerName>,
        worker: WorkerRef,
        policy: RestartPolicy,
    ) -> &mut Self {
        let name = name.into();
        if self.started {
            self.events.try_emit(
                Event::error("registration rejected: supervisor already started")
                    .with_worker(name),
            );
            return self;
        }
        if let Err(err) = self.pool.register(name.clone(), worker, policy) {
            self.events
                .try_emit(Event::error(err.to_string()).with_worker(name));
        }
        self
    }

    /// Returns the current state of all registered workers.
    pub fn snapshot(&self) -> BTreeMap<WorkerName, WorkerState> {
        self.pool.snapshot()
    }

    /// Replaces the default root cancellation token with a caller-owned
    /// one, so the application can cancel the supervisor from outside.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) -> &mut Self {
        let callback = self.gate.callback.lock().take();
        self.root = token.clone();
        let gate = ShutdownGate::new(token);
        *gate.callback.lock() = callback;
        self.gate = Arc::new(gate);
        self
    }

    /// Sets a custom locker: a future whose completion signals "stop".
    ///
    /// Without one, the default locker waits for SIGTERM/SIGINT.
    pub fn set_locker<F>(&mut self, locker: F) -> &mut Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.locker = Some(Box::pin(locker));
        self
    }

    /// Sets a callback that runs once after cancellation, for closing or
    /// retiring shared resources.
    pub fn set_shutdown(&mut self, callback: impl FnOnce() + Send + 'static) -> &mut Self {
        *self.gate.callback.lock() = Some(Box::new(callback));
        self
    }

    /// Replaces the default force-stop timeout.
    pub fn set_force_stop_timeout(&mut self, timeout: std::time::Duration) -> &mut Self {
        self.config.force_stop_timeout = timeout;
        self
    }

    /// Replaces the default broker with a custom implementation.
    pub fn set_broker(&mut self, broker: Box<dyn MessageBroker>) -> &mut Self {
        self.broker = Some(broker);
        self
    }

    /// Replaces the default broker with the no-op stub, for applications
    /// that do not use inter-worker messaging.
    pub fn use_nop_broker(&mut self) -> &mut Self {
        self.set_broker(Box::new(NopBroker))
    }

    /// Installs a callback invoked for every event.
    ///
    /// Mutually exclusive with [`Supervisor::events`]: once the channel
    /// has been taken, the handler is ignored.
    pub fn set_event_handler(
        &mut self,
        handler: impl Fn(Event) + Send + Sync + 'static,
    ) -> &mut Self {
        if self.event_rx.is_some() {
            self.event_handler = Some(Box::new(handler));
        }
        self
    }

    /// Takes the receiving half of the event channel.
    ///
    /// Mutually exclusive with [`Supervisor::set_event_handler`]: returns
    /// `None` when a handler is installed, and on every call after the
    /// first.
    pub fn events(&mut self) -> Option<mpsc::Receiver<Event>> {
        if self.event_handler.is_some() {
            return None;
        }
        self.event_rx.take()
    }

    /// Enables the management socket with the two built-in actions
    /// (`status`, `ping`) merged over `actions`.
    ///
    /// The socket path is derived from [`AppInfo::socket_path`].
    pub fn enable_service_socket(&mut self, app: AppInfo, actions: Vec<Action>) -> &mut Self {
        let pool = Arc::clone(&self.pool);
        let app_info = app.clone();
        let status = Action::new(STATUS_ACTION, move |_req| {
            Response::ok(StateInfo {
                app: app_info.clone(),
                workers: pool.snapshot(),
            })
        });
        let ping = Action::new(PING_ACTION, |_req| Response::ok("pong"));

        let mut server = SocketServer::new(app.socket_path(), actions);
        server.set_action(status);
        server.set_action(ping);
        self.socket = Some(server);
        self
    }

    /// Requests shutdown: cancels the root token and runs the shutdown
    /// callback. Idempotent in effect; the callback runs at most once.
    pub fn shutdown(&self) {
        self.gate.trigger();
    }

    /// Runs the supervisor until the locker completes and the pool
    /// drains, or until the force-stop timer fires.
    ///
    /// Every registered worker is started exactly once; the broker's
    /// dispatch loop and the management socket (when enabled) run
    /// alongside. After the locker completes, the pool gets
    /// `force_stop_timeout` to drain; past the deadline a
    /// "graceful shutdown failed" error event is emitted and
    /// [`RuntimeError::GraceExceeded`] is returned.
    pub async fn run(&mut self) -> Result<(), RuntimeError> {
        self.started = true;

        // Event pump, only for handler mode.
        if let Some(handler) = self.event_handler.take() {
            if let Some(mut rx) = self.event_rx.take() {
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        handler(event);
                    }
                });
            }
        }

        // Locker task: completes on the locker or on an external
        // cancellation (including StopAppOnFail escalation), then runs the
        // shutdown protocol.
        let locker = self.locker.take();
        let gate = Arc::clone(&self.gate);
        let root = self.root.clone();
        let (locker_done_tx, locker_done) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let wait: BoxFuture<'static, ()> = match locker {
                Some(custom) => custom,
                None => Box::pin(async {
                    let _ = signal::wait_for_stop_signal().await;
                }),
            };
            tokio::select! {
                _ = wait => {},
                _ = root.cancelled() => {},
            }
            gate.trigger();
            let _ = locker_done_tx.send(());
        });

        let names = self.pool.names();
        if names.is_empty() {
            return self.fail_start(RuntimeError::NoRunnableWorkers);
        }

        let mut broker = self.broker.take().unwrap_or_else(|| {
            let chan_len = self
                .config
                .mailbox_capacity
                .unwrap_or(self.pool.len() * 4);
            Box::new(Broker::new(chan_len))
        });
        if let Err(err) = broker.init() {
            return self.fail_start(err);
        }

        let scope = self.root.child_token();
        let mut set: JoinSet<()> = JoinSet::new();
        for name in names {
            let mailbox = broker.add_worker(&name);
            let token = scope.child_token();
            self.pool.set_cancel(&name, token.clone());
            let ctx = WorkerContext::new(token, mailbox);
            let pool = Arc::clone(&self.pool);
            let events = self.events.clone();
            let gate = Arc::clone(&self.gate);
            set.spawn(async move {
                if pool.execute(&name, ctx, &events).await == ExitReason::Escalated {
                    gate.trigger();
                }
            });
        }

        set.spawn(broker.serve(scope.clone()));

        if let Some(server) = self.socket.take() {
            let events = self.events.clone();
            let token = scope.clone();
            set.spawn(async move {
                if let Err(err) = server.serve(token).await {
                    events
                        .emit(Event::error(err.to_string()).with_worker(SOCKET_WORKER))
                        .await;
                }
            });
        }

        // Main routine: wait for the locker, then race the pool drain
        // against the force-stop timer.
        let _ = locker_done.await;

        let drain = async { while set.join_next().await.is_some() {} };
        match time::timeout(self.config.force_stop_timeout, drain).await {
            Ok(()) => Ok(()),
            Err(_elapsed) => {
                self.events.try_emit(Event::error("graceful shutdown failed"));
                Err(RuntimeError::GraceExceeded {
                    timeout: self.config.force_stop_timeout,
                })
            }
        }
    }

    fn fail_start(&self, err: RuntimeError) -> Result<(), RuntimeError> {
        self.events.try_emit(Event::error(err.to_string()));
        self.gate.trigger();
        Err(err)
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
