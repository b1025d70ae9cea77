//! # In-process message broker.
//!
//! The [`Broker`] owns one aggregate inbound queue that every mailbox
//! writes into and a hub of per-worker routes. Its dispatch loop reads the
//! aggregate queue and routes each message per the target:
//!
//! | target      | action                                                      |
//! |-------------|-------------------------------------------------------------|
//! | `SelfInit`  | register the sender's send-handle, ignore if already known  |
//! | `Broadcast` | copy to every registered mailbox except the sender's        |
//! | `Worker(n)` | deliver to `n` if registered, drop silently otherwise       |
//!
//! ## Delivery
//! Deliveries never block the dispatch loop: each recipient has an
//! unbounded staging queue drained by a dedicated forwarder task into the
//! recipient's bounded mailbox. One forwarder per recipient keeps
//! per-target order intact; back-pressure from a full mailbox is absorbed
//! by the staging queue instead of stalling the dispatcher.
//!
//! [`NopBroker`] implements the same interface with no-op mailboxes for
//! applications that do not use messaging.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::mailbox::mailbox::Mailbox;
use crate::mailbox::message::{Message, Target};
use crate::workers::WorkerName;

/// Routing component between worker mailboxes.
///
/// The supervisor builds a default [`Broker`] sized to the worker count;
/// a custom implementation (or [`NopBroker`]) can be swapped in via
/// [`Supervisor::set_broker`](crate::Supervisor::set_broker).
#[async_trait]
pub trait MessageBroker: Send + 'static {
    /// One-time setup before any dispatch. Default: nothing to do.
    fn init(&mut self) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// Returns a write-only mailbox that can post into the aggregate queue
    /// without being registered. Call [`Mailbox::self_init`] on it to also
    /// receive.
    fn default_sender(&self) -> Mailbox;

    /// Creates and registers a mailbox for `name`.
    ///
    /// Must be called before [`MessageBroker::serve`]; late joiners go
    /// through [`Mailbox::self_init`].
    fn add_worker(&mut self, name: &WorkerName) -> Mailbox;

    /// Runs the dispatch loop until `token` is cancelled.
    async fn serve(self: Box<Self>, token: CancellationToken);
}

/// A registered delivery route: unbounded staging into the bounded inbox.
struct Route {
    staging: mpsc::UnboundedSender<Message>,
}

/// Default in-process broker.
pub struct Broker {
    chan_len: usize,
    hub: HashMap<WorkerName, Route>,
    /// Forwarders to start when `serve` begins: (staging out, inbox in).
    pending: Vec<(mpsc::UnboundedReceiver<Message>, mpsc::Sender<Message>)>,
    agg_tx: mpsc::Sender<Message>,
    agg_rx: mpsc::Receiver<Message>,
}

impl Broker {
    /// Creates a broker whose queues hold `chan_len` messages (minimum 1).
    ///
    /// The supervisor's default is `4 × registered worker count`.
    pub fn new(chan_len: usize) -> Self {
        let chan_len = chan_len.max(1);
        let (agg_tx, agg_rx) = mpsc::channel(chan_len);
        Self {
            chan_len,
            hub: HashMap::new(),
            pending: Vec::new(),
            agg_tx,
            agg_rx,
        }
    }
}

#[async_trait]
impl MessageBroker for Broker {
    fn default_sender(&self) -> Mailbox {
        let (inbox_tx, inbox_rx) = mpsc::channel(2);
        Mailbox::wired(
            WorkerName::from(""),
            inbox_tx,
            inbox_rx,
            self.agg_tx.clone(),
        )
    }

    fn add_worker(&mut self, name: &WorkerName) -> Mailbox {
        let (inbox_tx, inbox_rx) = mpsc::channel(self.chan_len);
        let (staging_tx, staging_rx) = mpsc::unbounded_channel();
        self.hub.insert(
            name.clone(),
            Route {
                staging: staging_tx,
            },
        );
        self.pending.push((staging_rx, inbox_tx.clone()));
        Mailbox::wired(name.clone(), inbox_tx, inbox_rx, self.agg_tx.clone())
    }

    async fn serve(self: Box<Self>, token: CancellationToken) {
        let Broker {
            mut hub,
            pending,
            mut agg_rx,
            ..
        } = *self;

        for (staging_rx, inbox_tx) in pending {
            spawn_forwarder(staging_rx, inbox_tx, token.clone());
        }

        loop {
            let msg = tokio::select! {
                _ = token.cancelled() => return,
                msg = agg_rx.recv() => match msg {
                    Some(msg) => msg,
                    None => return,
                },
            };

            match &msg.target {
                Target::SelfInit => {
                    if hub.contains_key(&msg.sender) {
                        continue;
                    }
                    if let Some(inbox_tx) = msg.data_ref::<mpsc::Sender<Message>>() {
                        let (staging_tx, staging_rx) = mpsc::unbounded_channel();
                        spawn_forwarder(staging_rx, inbox_tx.clone(), token.clone());
                        hub.insert(
                            msg.sender.clone(),
                            Route {
                                staging: staging_tx,
                            },
                        );
                    }
                }
                Target::Broadcast => {
                    for (name, route) in &hub {
                        if *name == msg.sender {
                            continue;
                        }
                        let _ = route.staging.send(msg.clone());
                    }
                }
                Target::Worker(name) => {
                    if let Some(route) = hub.get(name) {
                        let _ = route.staging.send(msg.clone());
                    }
                }
            }
        }
    }
}

/// Drains one recipient's staging queue into its bounded mailbox.
///
/// A single forwarder per recipient preserves per-target delivery order.
fn spawn_forwarder(
    mut staging_rx: mpsc::UnboundedReceiver<Message>,
    inbox_tx: mpsc::Sender<Message>,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                _ = token.cancelled() => return,
                msg = staging_rx.recv() => match msg {
                    Some(msg) => msg,
                    None => return,
                },
            };
            tokio::select! {
                _ = token.cancelled() => return,
                res = inbox_tx.send(msg) => {
                    if res.is_err() {
                        return;
                    }
                }
            }
        }
    });
}

/// Broker stub for applications without messaging.
///
/// All mailboxes it hands out are no-ops and `serve` returns immediately.
pub struct NopBroker;

#[async_trait]
impl MessageBroker for NopBroker {
    fn default_sender(&self) -> Mailbox {
        Mailbox::nop()
    }

    fn add_worker(&mut self, _name: &WorkerName) -> Mailbox {
        Mailbox::nop()
    }

    async fn serve(self: Box<Self>, _token: CancellationToken) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unicast_reaches_only_the_target() {
        let mut broker = Broker::new(4);
        let a = broker.add_worker(&WorkerName::from("a"));
        let b = broker.add_worker(&WorkerName::from("b"));
        let c = broker.add_worker(&WorkerName::from("c"));

        let token = CancellationToken::new();
        tokio::spawn(Box::new(broker).serve(token.clone()));

        a.send("b", String::from("direct")).await;
        let got = b.recv().await.unwrap();
        assert_eq!(got.sender, WorkerName::from("a"));
        assert_eq!(got.data_ref::<String>().map(String::as_str), Some("direct"));

        let idle = tokio::time::timeout(std::time::Duration::from_millis(50), c.recv()).await;
        assert!(idle.is_err(), "c must not receive a unicast addressed to b");
        token.cancel();
    }

    #[tokio::test]
    async fn broadcast_skips_the_sender() {
        let mut broker = Broker::new(4);
        let a = broker.add_worker(&WorkerName::from("a"));
        let b = broker.add_worker(&WorkerName::from("b"));
        let c = broker.add_worker(&WorkerName::from("c"));

        let token = CancellationToken::new();
        tokio::spawn(Box::new(broker).serve(token.clone()));

        a.send("*", 7u8).await;
        assert_eq!(b.recv().await.unwrap().data_ref::<u8>(), Some(&7));
        assert_eq!(c.recv().await.unwrap().data_ref::<u8>(), Some(&7));

        let idle = tokio::time::timeout(std::time::Duration::from_millis(50), a.recv()).await;
        assert!(idle.is_err(), "sender must not receive its own broadcast");
        token.cancel();
    }

    #[tokio::test]
    async fn per_target_order_is_preserved() {
        let mut broker = Broker::new(2);
        let a = broker.add_worker(&WorkerName::from("a"));
        let b = broker.add_worker(&WorkerName::from("b"));

        let token = CancellationToken::new();
        tokio::spawn(Box::new(broker).serve(token.clone()));

        for i in 0..32u32 {
            a.send("b", i).await;
        }
        for i in 0..32u32 {
            let got = b.recv().await.unwrap();
            assert_eq!(got.data_ref::<u32>(), Some(&i));
        }
        token.cancel();
    }

    #[tokio::test]
    async fn self_init_registers_late_senders_once() {
        let mut broker = Broker::new(4);
        let a = broker.add_worker(&WorkerName::from("a"));
        let outsider = broker.default_sender();

        let token = CancellationToken::new();
        tokio::spawn(Box::new(broker).serve(token.clone()));

        let late = outsider.self_init("late").await;
        // a second self-init for the same name must be ignored
        let _ = late.self_init("late").await;

        a.send("late", String::from("welcome")).await;
        let got = late.recv().await.unwrap();
        assert_eq!(
            got.data_ref::<String>().map(String::as_str),
            Some("welcome")
        );
        token.cancel();
    }

    #[tokio::test]
    async fn unknown_target_is_dropped_silently() {
        let mut broker = Broker::new(4);
        let a = broker.add_worker(&WorkerName::from("a"));
        let b = broker.add_worker(&WorkerName::from("b"));

        let token = CancellationToken::new();
        tokio::spawn(Box::new(broker).serve(token.clone()));

        a.send("ghost", ()).await;
        a.send("b", String::from("after")).await;
        // the queue keeps flowing after the drop
        let got = b.recv().await.unwrap();
        assert_eq!(got.data_ref::<String>().map(String::as_str), Some("after"));
        token.cancel();
    }
}
