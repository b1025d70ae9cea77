//! Structured events and their delivery plumbing.

mod bus;
mod event;
mod log;

pub(crate) use bus::EventBus;

pub use bus::EventHandler;
pub use event::{Event, EventLevel};
pub use log::tracing_handler;
