//! # Structured runtime events emitted by the supervisor.
//!
//! An [`Event`] carries a severity [`EventLevel`], an optional worker
//! attribution, a human-readable message, and free-form key/value fields.
//! Events are delivered either to a user callback or through the event
//! channel, never both (see [`Supervisor`](crate::Supervisor)).
//!
//! ## Example
//! ```rust
//! use foreman::{Event, EventLevel};
//!
//! let ev = Event::error("worker failed")
//!     .with_worker("billing")
//!     .with_field("error", "connection refused");
//!
//! assert_eq!(ev.level, EventLevel::Error);
//! assert!(ev.is_error());
//! assert_eq!(ev.worker.as_ref().map(|w| w.as_str()), Some("billing"));
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::workers::WorkerName;

/// Severity of a runtime event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    /// Lifecycle progress.
    Info,
    /// A failure the supervisor survived.
    Error,
    /// A failure that ends a worker for good or the whole application.
    Fatal,
}

/// One structured runtime event.
#[derive(Clone, Debug, Serialize)]
pub struct Event {
    /// Severity.
    pub level: EventLevel,
    /// Worker the event is attributed to, if any.
    pub worker: Option<WorkerName>,
    /// Human-readable message.
    pub message: String,
    /// Free-form structured context.
    pub fields: BTreeMap<String, Value>,
}

impl Event {
    fn new(level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            worker: None,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Creates an info-level event.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Info, message)
    }

    /// Creates an error-level event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Error, message)
    }

    /// Creates a fatal-level event.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Fatal, message)
    }

    /// Sets the worker attribution.
    pub fn with_worker(mut self, name: impl Into<WorkerName>) -> Self {
        self.worker = Some(name.into());
        self
    }

    /// Adds one key/value field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// True for error-level events.
    pub fn is_error(&self) -> bool {
        self.level == EventLevel::Error
    }

    /// True for fatal-level events.
    pub fn is_fatal(&self) -> bool {
        self.level == EventLevel::Fatal
    }

    /// Casts error- and fatal-level events to a plain error message.
    pub fn to_error(&self) -> Option<String> {
        if self.is_error() || self.is_fatal() {
            Some(self.message.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_fill_all_parts() {
        let ev = Event::fatal("caught panic")
            .with_worker("p")
            .with_field("error", "boom")
            .with_field("attempt", 2);
        assert!(ev.is_fatal());
        assert_eq!(ev.fields["error"], "boom");
        assert_eq!(ev.fields["attempt"], 2);
        assert_eq!(ev.to_error().as_deref(), Some("caught panic"));
    }

    #[test]
    fn info_does_not_cast_to_error() {
        assert!(Event::info("starting").to_error().is_none());
        assert!(!Event::info("starting").is_error());
    }
}
