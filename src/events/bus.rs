//! Internal emitter side of the event channel.
//!
//! One bounded mpsc channel carries every [`Event`] the runtime produces.
//! The receiver half belongs to the supervisor until the caller either
//! takes it ([`Supervisor::events`](crate::Supervisor::events)) or
//! installs a handler, in which case an internal pump drains it.

use tokio::sync::mpsc;

use crate::events::event::Event;

/// Callback invoked by the event pump for every event.
pub type EventHandler = Box<dyn Fn(Event) + Send + Sync + 'static>;

/// Cloneable emitter handle.
#[derive(Clone)]
pub(crate) struct EventBus {
    tx: mpsc::Sender<Event>,
}

impl EventBus {
    /// Creates the channel; the receiver goes to the supervisor.
    pub(crate) fn new(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Emits an event, waiting for channel capacity.
    ///
    /// A dropped receiver makes this a no-op; the runtime keeps working
    /// without an observer.
    pub(crate) async fn emit(&self, event: Event) {
        let _ = self.tx.send(event).await;
    }

    /// Non-blocking emit for paths that must never stall, such as the
    /// shutdown deadline. Drops the event when the channel is full.
    pub(crate) fn try_emit(&self, event: Event) {
        let _ = self.tx.try_send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_delivers_in_order() {
        let (bus, mut rx) = EventBus::new(4);
        bus.emit(Event::info("one")).await;
        bus.emit(Event::info("two")).await;
        assert_eq!(rx.recv().await.unwrap().message, "one");
        assert_eq!(rx.recv().await.unwrap().message, "two");
    }

    #[tokio::test]
    async fn try_emit_drops_on_full_channel() {
        let (bus, mut rx) = EventBus::new(1);
        bus.try_emit(Event::info("kept"));
        bus.try_emit(Event::info("dropped"));
        assert_eq!(rx.recv().await.unwrap().message, "kept");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn emit_survives_a_dropped_receiver() {
        let (bus, rx) = EventBus::new(1);
        drop(rx);
        bus.emit(Event::info("void")).await;
        bus.try_emit(Event::info("void"));
    }
}
