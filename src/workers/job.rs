//! Periodic job: a worker that runs an action on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::workers::worker::Worker;

/// Worker that performs an `action` callback with a given period until
/// cancelled.
///
/// The first tick fires one full period after the run starts. An action
/// error ends the run with that error, so the worker's restart policy
/// decides what happens next.
///
/// ```rust
/// use std::time::Duration;
/// use foreman::{Job, WorkerError};
///
/// let job = Job::arc(Duration::from_secs(30), || async {
///     // flush buffers, poll a queue, ...
///     Ok::<_, WorkerError>(())
/// });
/// ```
pub struct Job<F> {
    period: Duration,
    action: F,
}

impl<F> Job<F> {
    /// Creates a new job with the given `period`.
    pub fn new(period: Duration, action: F) -> Self {
        Self { period, action }
    }

    /// Creates the job and returns it as a shared handle.
    pub fn arc(period: Duration, action: F) -> Arc<Self> {
        Arc::new(Self::new(period, action))
    }
}

#[async_trait]
impl<F, Fut> Worker for Job<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), WorkerError>> + Send + 'static,
{
    async fn run(&self, ctx: WorkerContext) -> Result<(), WorkerError> {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Ok(()),
                _ = ticker.tick() => (self.action)().await?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio_util::sync::CancellationToken;

    use crate::mailbox::Mailbox;

    #[tokio::test]
    async fn ticks_until_cancelled() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&ticks);
        let job = Job::arc(Duration::from_millis(20), move || {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok::<(), WorkerError>(())
            }
        });

        let token = CancellationToken::new();
        let ctx = WorkerContext::new(token.clone(), Mailbox::nop());
        let handle = tokio::spawn(async move { job.run(ctx).await });

        tokio::time::sleep(Duration::from_millis(110)).await;
        token.cancel();
        handle.await.unwrap().unwrap();
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn action_error_ends_the_run() {
        let job = Job::arc(Duration::from_millis(5), || async {
            Err::<(), _>(WorkerError::fail("flush failed"))
        });
        let ctx = WorkerContext::new(CancellationToken::new(), Mailbox::nop());
        let err = job.run(ctx).await.unwrap_err();
        assert!(err.to_string().contains("flush failed"));
    }
}
