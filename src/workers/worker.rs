//! # Worker abstraction for supervised execution.
//!
//! Defines the core [`Worker`] trait for async, cancelable units of work.
//!
//! - **[`Worker`]** — trait for implementing async workers with optional
//!   initialization and cancellation support
//! - **[`WorkerRef`]** — shared handle (`Arc<dyn Worker>`) for passing
//!   workers across the runtime
//! - **[`WorkerFn`]** — function-backed implementation that wraps closures
//!   as workers
//! - **[`WorkerName`]** — non-empty opaque identifier, unique within one
//!   supervisor
//!
//! ## Rules
//! - `init` must be idempotent across re-init cycles; the default
//!   implementation is a no-op success.
//! - `run` receives a [`WorkerContext`] and **must** return promptly after
//!   the cancellation signal fires.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::WorkerContext;
use crate::error::WorkerError;

/// Non-empty opaque identifier of a worker, unique within one supervisor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerName(String);

impl WorkerName {
    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WorkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkerName {
    fn from(s: &str) -> Self {
        WorkerName(s.to_owned())
    }
}

impl From<String> for WorkerName {
    fn from(s: String) -> Self {
        WorkerName(s)
    }
}

impl From<&WorkerName> for WorkerName {
    fn from(name: &WorkerName) -> Self {
        name.clone()
    }
}

/// Shared handle to a worker object.
///
/// Used throughout the runtime for registering workers with the
/// [`Supervisor`](crate::Supervisor) and re-running them across restart
/// cycles.
pub type WorkerRef = Arc<dyn Worker>;

/// Asynchronous, cancelable, named-at-registration unit of work.
///
/// A worker is registered under a [`WorkerName`] and driven by the pool
/// through its whole lifecycle, possibly several times when its restart
/// policy allows it.
///
/// ## Rules
/// - `init` is optional; implementations that need no setup keep the
///   default. It must tolerate being called again before a re-run.
/// - `run` must watch `ctx` and return soon after cancellation; a worker
///   that ignores the signal will be force-stopped at the supervisor's
///   force-stop deadline.
///
/// ## Example
///
/// ```rust
/// use async_trait::async_trait;
/// use foreman::{Worker, WorkerContext, WorkerError};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Worker for Ticker {
///     async fn run(&self, ctx: WorkerContext) -> Result<(), WorkerError> {
///         while !ctx.is_cancelled() {
///             tokio::time::sleep(std::time::Duration::from_millis(100)).await;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Prepares outer-context state (connectors, files, sockets).
    ///
    /// Called once before the first `run` and, for policies with re-init,
    /// before each re-run. The default is a no-op success.
    async fn init(&self) -> Result<(), WorkerError> {
        Ok(())
    }

    /// Runs the worker until completion or cancellation.
    ///
    /// Return `Ok(())` for a clean stop (including a stop in response to
    /// cancellation) and `Err` for a failure that the restart policy may
    /// act on.
    async fn run(&self, ctx: WorkerContext) -> Result<(), WorkerError>;
}

/// Function-backed worker implementation.
///
/// Wraps a closure that *creates* a new future per run, so restarts get a
/// fresh future each time and no state leaks between attempts.
///
/// ## Example
/// ```rust
/// use foreman::{WorkerContext, WorkerError, WorkerFn, WorkerRef};
///
/// let w: WorkerRef = WorkerFn::arc(|ctx: WorkerContext| async move {
///     ctx.cancelled().await;
///     Ok::<_, WorkerError>(())
/// });
/// ```
pub struct WorkerFn<F> {
    f: F,
}

impl<F> WorkerFn<F> {
    /// Creates a new function-backed worker.
    ///
    /// Prefer [`WorkerFn::arc`] when you immediately need a [`WorkerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the worker and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Worker for WorkerFn<F>
where
    F: Fn(WorkerContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), WorkerError>> + Send + 'static,
{
    async fn run(&self, ctx: WorkerContext) -> Result<(), WorkerError> {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_conversions() {
        let name = WorkerName::from("api-server");
        assert_eq!(name.as_str(), "api-server");
        assert_eq!(name.to_string(), "api-server");
        assert!(WorkerName::from("").is_empty());
    }

    #[tokio::test]
    async fn worker_fn_default_init_succeeds() {
        let w = WorkerFn::arc(|_ctx: WorkerContext| async { Ok::<_, WorkerError>(()) });
        assert!(w.init().await.is_ok());
    }
}
