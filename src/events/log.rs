//! Bridge from supervisor events to `tracing`.

use crate::events::bus::EventHandler;
use crate::events::event::{Event, EventLevel};

/// Returns an [`EventHandler`] that forwards events to `tracing`.
///
/// Info events become `tracing::info!` records, error events
/// `tracing::warn!`, fatal events `tracing::error!`. The worker name and
/// structured fields are attached to each record.
///
/// ```rust,no_run
/// use foreman::{tracing_handler, Supervisor};
///
/// let mut chief = Supervisor::new();
/// chief.set_event_handler(tracing_handler());
/// ```
pub fn tracing_handler() -> EventHandler {
    Box::new(|event: Event| {
        let worker = event
            .worker
            .as_ref()
            .map(|w| w.as_str().to_owned())
            .unwrap_or_default();
        let fields = serde_json::Value::Object(
            event
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        match event.level {
            EventLevel::Info => {
                tracing::info!(worker = %worker, fields = %fields, "{}", event.message);
            }
            EventLevel::Error => {
                tracing::warn!(worker = %worker, fields = %fields, "{}", event.message);
            }
            EventLevel::Fatal => {
                tracing::error!(worker = %worker, fields = %fields, "{}", event.message);
            }
        }
    })
}
