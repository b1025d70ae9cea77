//! In-process messaging: mailboxes, messages, and the broker.

mod broker;
#[allow(clippy::module_inception)]
mod mailbox;
mod message;

pub use broker::{Broker, MessageBroker, NopBroker};
pub use mailbox::Mailbox;
pub use message::{
    payload, Message, MessageKind, Payload, Target, TARGET_BROADCAST, TARGET_SELF_INIT,
};
