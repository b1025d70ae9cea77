//! # Inter-worker message model.
//!
//! A [`Message`] travels from a sender's mailbox into the broker's
//! aggregate queue and from there into the target mailbox(es). The
//! payload is an opaque shared value ([`Payload`]); recipients downcast
//! it to the concrete type they expect.

use std::any::Any;
use std::sync::Arc;

use crate::workers::WorkerName;

/// Broadcast sentinel accepted by the send APIs.
pub const TARGET_BROADCAST: &str = "*";
/// Self-registration sentinel accepted by the send APIs.
pub const TARGET_SELF_INIT: &str = "self-init";

/// Application-defined message discriminator.
pub type MessageKind = i32;

/// Opaque shared message payload.
///
/// Wrap with [`payload`] and read back with [`Message::data_ref`].
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Wraps a value into a [`Payload`].
pub fn payload<T: Any + Send + Sync>(value: T) -> Payload {
    Arc::new(value)
}

/// Routing target of a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Deliver to the named worker's mailbox, if registered.
    Worker(WorkerName),
    /// Deliver a copy to every registered mailbox except the sender's.
    Broadcast,
    /// Register the sender's mailbox with the broker; the payload must be
    /// the mailbox's inbound send-handle.
    SelfInit,
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        match s {
            TARGET_BROADCAST => Target::Broadcast,
            TARGET_SELF_INIT => Target::SelfInit,
            name => Target::Worker(WorkerName::from(name)),
        }
    }
}

impl From<WorkerName> for Target {
    fn from(name: WorkerName) -> Self {
        Target::Worker(name)
    }
}

impl From<&WorkerName> for Target {
    fn from(name: &WorkerName) -> Self {
        Target::Worker(name.clone())
    }
}

/// One routed message.
#[derive(Clone)]
pub struct Message {
    /// Mailbox name the message was sent from.
    pub sender: WorkerName,
    /// Routing target.
    pub target: Target,
    /// Optional application-defined discriminator.
    pub kind: Option<MessageKind>,
    /// Opaque payload, shared between broadcast copies.
    pub data: Payload,
}

impl Message {
    /// Downcasts the payload to a concrete type.
    pub fn data_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_sentinels() {
        assert_eq!(Target::from("*"), Target::Broadcast);
        assert_eq!(Target::from("self-init"), Target::SelfInit);
        assert_eq!(
            Target::from("billing"),
            Target::Worker(WorkerName::from("billing"))
        );
    }

    #[test]
    fn payload_downcast() {
        let msg = Message {
            sender: WorkerName::from("a"),
            target: Target::from("b"),
            kind: Some(7),
            data: payload(String::from("hello")),
        };
        assert_eq!(msg.data_ref::<String>().map(String::as_str), Some("hello"));
        assert!(msg.data_ref::<i64>().is_none());
    }
}
