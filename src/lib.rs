//! # foreman
//!
//! **Foreman** is an embedded supervisor for a fixed set of named,
//! long-running async workers.
//!
//! It initializes each worker, launches them concurrently, coordinates
//! graceful shutdown on an external stop signal, applies configured
//! restart policies on failure, and routes inter-worker messages through
//! an in-process broker. An optional management socket exposes the
//! current state of all workers over local IPC.
//!
//! ## Features
//!
//! | Area            | Description                                                     | Key types / traits                        |
//! |-----------------|-----------------------------------------------------------------|-------------------------------------------|
//! | **Supervision** | Launch, restart, and drain a pool of named workers.             | [`Supervisor`], [`SupervisorConfig`]      |
//! | **Workers**     | Define workers as trait impls or closures.                      | [`Worker`], [`WorkerFn`], [`Job`]         |
//! | **Lifecycle**   | Validated per-worker state machine.                             | [`WorkerState`], [`StateMachine`]         |
//! | **Policies**    | Restart on error/panic, with or without re-init, or escalate.   | [`RestartPolicy`], [`RestartTriggers`]    |
//! | **Messaging**   | Per-worker mailboxes with unicast and broadcast routing.        | [`Mailbox`], [`Message`], [`Broker`]      |
//! | **Events**      | Structured info/error/fatal stream with worker attribution.     | [`Event`], [`EventHandler`]               |
//! | **Management**  | Unix-socket status/ping surface plus a one-shot client.         | [`socket::SocketServer`], [`AppInfo`]     |
//! | **Errors**      | Typed errors for the runtime and for worker executions.         | [`RuntimeError`], [`WorkerError`]         |
//!
//! ## Worker lifecycle
//!
//! ```text
//! (*) -> [New] -> [Initialized] -> [Running] -> [Stopped]
//!          |             |             |
//!          |             |             v
//!          |-------------+--------> [Failed]
//! ```
//!
//! ```no_run
//! use foreman::{RestartPolicy, Supervisor, WorkerContext, WorkerError, WorkerFn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), foreman::RuntimeError> {
//!     let mut chief = Supervisor::new();
//!     chief.set_event_handler(foreman::tracing_handler());
//!
//!     chief.add_worker(
//!         "heartbeat",
//!         WorkerFn::arc(|ctx: WorkerContext| async move {
//!             while !ctx.is_cancelled() {
//!                 tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!             }
//!             Ok::<_, WorkerError>(())
//!         }),
//!         RestartPolicy::always(),
//!     );
//!
//!     // Blocks until SIGTERM/SIGINT, then drains every worker.
//!     chief.run().await
//! }
//! ```

mod config;
mod context;
mod error;
mod events;
mod health;
mod mailbox;
mod signal;
pub mod socket;
mod supervisor;
mod workers;

// ---- Public re-exports ----

pub use config::{SupervisorConfig, DEFAULT_FORCE_STOP_TIMEOUT};
pub use context::WorkerContext;
pub use error::{RuntimeError, WorkerError};
pub use events::{tracing_handler, Event, EventHandler, EventLevel};
pub use health::{AppInfo, StateInfo, PING_ACTION, STATUS_ACTION};
pub use mailbox::{
    payload, Broker, Mailbox, Message, MessageBroker, MessageKind, NopBroker, Payload, Target,
    TARGET_BROADCAST, TARGET_SELF_INIT,
};
pub use signal::wait_for_stop_signal;
pub use supervisor::Supervisor;
pub use workers::{
    Job, RestartPolicy, RestartTriggers, StateMachine, Worker, WorkerFn, WorkerName, WorkerRef,
    WorkerState,
};
