//! # Supervisor configuration.
//!
//! [`SupervisorConfig`] centralizes the runtime settings: the force-stop
//! timeout bounding graceful shutdown, the event-channel capacity, and an
//! optional mailbox-capacity override.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use foreman::SupervisorConfig;
//!
//! let mut cfg = SupervisorConfig::default();
//! cfg.force_stop_timeout = Duration::from_secs(10);
//!
//! assert_eq!(cfg.mailbox_capacity, None);
//! ```

use std::time::Duration;

/// Default timeout before the remaining workers are force-stopped.
pub const DEFAULT_FORCE_STOP_TIMEOUT: Duration = Duration::from_secs(45);

/// Global configuration for the supervisor runtime.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum time to wait for graceful shutdown after the locker
    /// returns, before giving up on the remaining workers.
    pub force_stop_timeout: Duration,
    /// Capacity of the event channel. Emitters on the shutdown path never
    /// block on it; all other emitters do once it is full, so consume
    /// events promptly or install a handler.
    pub event_capacity: usize,
    /// Per-queue message capacity for the default broker.
    /// `None` means `4 × registered worker count`.
    pub mailbox_capacity: Option<usize>,
}

impl Default for SupervisorConfig {
    /// Provides the default configuration:
    /// - `force_stop_timeout = 45s`
    /// - `event_capacity = 64`
    /// - `mailbox_capacity = None` (sized to the worker count)
    fn default() -> Self {
        Self {
            force_stop_timeout: DEFAULT_FORCE_STOP_TIMEOUT,
            event_capacity: 64,
            mailbox_capacity: None,
        }
    }
}
