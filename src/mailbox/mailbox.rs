//! # Per-worker mailbox.
//!
//! A [`Mailbox`] bundles a worker's bounded inbound queue with a write
//! handle to the broker's aggregate queue. Mailboxes are created by the
//! broker when a worker is registered ([`super::MessageBroker::add_worker`])
//! or lazily via [`Mailbox::self_init`] for senders that join after the
//! dispatch loop started (the management surface uses this).
//!
//! The no-op variant returned by [`Mailbox::nop`] swallows sends and its
//! `recv` never resolves; it stands in when messaging is disabled.

use std::any::Any;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::mailbox::message::{payload, Message, MessageKind, Payload, Target};
use crate::workers::WorkerName;

/// Mailbox bound to one worker name.
///
/// Cloning shares the same queues; the inbound queue has a single logical
/// consumer (the owning worker).
#[derive(Clone)]
pub struct Mailbox {
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    Wired {
        name: WorkerName,
        /// Inbound queue, consumed by the owning worker.
        inbox: Arc<Mutex<mpsc::Receiver<Message>>>,
        /// Send-handle to the inbound queue; shipped to the broker on self-init.
        inbox_tx: mpsc::Sender<Message>,
        /// Write handle into the broker's aggregate queue.
        outbox: mpsc::Sender<Message>,
    },
    Nop,
}

impl Mailbox {
    pub(crate) fn wired(
        name: WorkerName,
        inbox_tx: mpsc::Sender<Message>,
        inbox_rx: mpsc::Receiver<Message>,
        outbox: mpsc::Sender<Message>,
    ) -> Self {
        Self {
            inner: Inner::Wired {
                name,
                inbox: Arc::new(Mutex::new(inbox_rx)),
                inbox_tx,
                outbox,
            },
        }
    }

    /// A mailbox whose sends are no-ops and whose `recv` never resolves.
    pub fn nop() -> Self {
        Self { inner: Inner::Nop }
    }

    /// Name this mailbox sends under.
    pub fn name(&self) -> Option<&WorkerName> {
        match &self.inner {
            Inner::Wired { name, .. } => Some(name),
            Inner::Nop => None,
        }
    }

    /// Receives the next inbound message.
    ///
    /// The stream is infinite for the lifetime of the broker: `None` is
    /// returned only after the broker shut down and the queue drained.
    /// On a no-op mailbox this future never resolves.
    pub async fn recv(&self) -> Option<Message> {
        match &self.inner {
            Inner::Wired { inbox, .. } => inbox.lock().await.recv().await,
            Inner::Nop => std::future::pending().await,
        }
    }

    /// Sends `data` to `target` without a kind tag.
    pub async fn send(&self, target: impl Into<Target>, data: impl Any + Send + Sync) {
        self.post(target.into(), None, payload(data)).await;
    }

    /// Sends `data` to `target` with a kind tag.
    pub async fn send_with_kind(
        &self,
        target: impl Into<Target>,
        kind: MessageKind,
        data: impl Any + Send + Sync,
    ) {
        self.post(target.into(), Some(kind), payload(data)).await;
    }

    /// Sends the same payload to several targets as individual unicasts.
    pub async fn send_to_many<I, T>(&self, kind: MessageKind, data: impl Any + Send + Sync, targets: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<WorkerName>,
    {
        let shared = payload(data);
        for target in targets {
            self.post(
                Target::Worker(target.into()),
                Some(kind),
                Arc::clone(&shared),
            )
            .await;
        }
    }

    /// Registers this mailbox with the broker under `name` and returns the
    /// renamed handle.
    ///
    /// Intended for mailboxes obtained from
    /// [`MessageBroker::default_sender`](super::MessageBroker::default_sender);
    /// mailboxes created by `add_worker` are registered already, and a
    /// repeated self-init for a known name is ignored by the broker.
    pub async fn self_init(&self, name: impl Into<WorkerName>) -> Mailbox {
        match &self.inner {
            Inner::Wired {
                inbox,
                inbox_tx,
                outbox,
                ..
            } => {
                let renamed = Mailbox {
                    inner: Inner::Wired {
                        name: name.into(),
                        inbox: Arc::clone(inbox),
                        inbox_tx: inbox_tx.clone(),
                        outbox: outbox.clone(),
                    },
                };
                renamed
                    .post(Target::SelfInit, None, payload(inbox_tx.clone()))
                    .await;
                renamed
            }
            Inner::Nop => Mailbox::nop(),
        }
    }

    async fn post(&self, target: Target, kind: Option<MessageKind>, data: Payload) {
        if let Inner::Wired { name, outbox, .. } = &self.inner {
            // A closed aggregate queue means the broker is gone; the send
            // is dropped, same as any message sent after shutdown.
            let _ = outbox
                .send(Message {
                    sender: name.clone(),
                    target,
                    kind,
                    data,
                })
                .await;
        }
    }
}
