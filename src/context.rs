//! # Execution context handed to every worker run.
//!
//! [`WorkerContext`] carries the two things a worker needs from the
//! runtime: the cancellation signal and its mailbox.

use tokio_util::sync::CancellationToken;

use crate::mailbox::Mailbox;

/// Per-run context: cancellation signal plus mailbox handle.
///
/// Cloning is cheap; clones observe the same cancellation and share the
/// same mailbox queues.
#[derive(Clone)]
pub struct WorkerContext {
    token: CancellationToken,
    mailbox: Mailbox,
}

impl WorkerContext {
    pub(crate) fn new(token: CancellationToken, mailbox: Mailbox) -> Self {
        Self { token, mailbox }
    }

    /// True once shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when shutdown is requested. Safe to await repeatedly and
    /// from several clones.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// The underlying cancellation token, for `select!` arms and for
    /// deriving child scopes.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }

    /// This worker's mailbox.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_cancellation() {
        let token = CancellationToken::new();
        let ctx = WorkerContext::new(token.clone(), Mailbox::nop());
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
        assert!(clone.is_cancelled());
        clone.cancelled().await;
    }
}
