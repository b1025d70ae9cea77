//! # Restart policies for supervised workers.
//!
//! [`RestartPolicy`] decides what happens after a worker's `run` ends
//! abnormally:
//!
//! - [`RestartPolicy::Never`] the worker is not re-run (default).
//! - [`RestartPolicy::StopAppOnFail`] any failure escalates: a fatal event
//!   is emitted and the whole supervisor shuts down.
//! - [`RestartPolicy::On`] the worker is re-run when the failure matches
//!   the configured [`RestartTriggers`].
//!
//! The two terminal variants are mutually exclusive with the trigger set
//! by construction. A worker that fails while shutdown is already in
//! progress is never restarted, regardless of policy.

/// Policy controlling whether and how a failed worker is re-run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Never restart: the worker runs once and exits permanently (default).
    #[default]
    Never,
    /// Escalate any failure to a full supervisor shutdown.
    StopAppOnFail,
    /// Restart when the failure matches the given triggers.
    On(RestartTriggers),
}

/// Independent restart triggers for [`RestartPolicy::On`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestartTriggers {
    /// Re-run after a caught panic in `run`.
    pub on_panic: bool,
    /// Re-run after `run` returned an error.
    pub on_error: bool,
    /// Call `init` again before the re-run (otherwise `run` is re-entered directly).
    pub with_reinit: bool,
}

impl RestartPolicy {
    /// Restart only after a caught panic.
    pub fn on_panic() -> Self {
        RestartPolicy::On(RestartTriggers {
            on_panic: true,
            ..RestartTriggers::default()
        })
    }

    /// Restart only after an error return.
    pub fn on_error() -> Self {
        RestartPolicy::On(RestartTriggers {
            on_error: true,
            ..RestartTriggers::default()
        })
    }

    /// Restart after both panics and error returns.
    pub fn always() -> Self {
        RestartPolicy::On(RestartTriggers {
            on_panic: true,
            on_error: true,
            with_reinit: false,
        })
    }

    /// Restart after both panics and error returns, re-running `init` first.
    pub fn always_with_reinit() -> Self {
        RestartPolicy::always().with_reinit()
    }

    /// Adds the re-init step to a trigger-based policy.
    ///
    /// No effect on [`RestartPolicy::Never`] and
    /// [`RestartPolicy::StopAppOnFail`].
    pub fn with_reinit(self) -> Self {
        match self {
            RestartPolicy::On(triggers) => RestartPolicy::On(RestartTriggers {
                with_reinit: true,
                ..triggers
            }),
            other => other,
        }
    }

    /// True for [`RestartPolicy::StopAppOnFail`].
    pub fn stops_app(&self) -> bool {
        matches!(self, RestartPolicy::StopAppOnFail)
    }

    pub(crate) fn triggers(&self) -> RestartTriggers {
        match self {
            RestartPolicy::On(triggers) => *triggers,
            _ => RestartTriggers::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_never() {
        assert_eq!(RestartPolicy::default(), RestartPolicy::Never);
        let triggers = RestartPolicy::default().triggers();
        assert!(!triggers.on_panic && !triggers.on_error && !triggers.with_reinit);
    }

    #[test]
    fn always_covers_both_failure_kinds() {
        let triggers = RestartPolicy::always().triggers();
        assert!(triggers.on_panic);
        assert!(triggers.on_error);
        assert!(!triggers.with_reinit);
    }

    #[test]
    fn with_reinit_only_applies_to_trigger_policies() {
        assert!(RestartPolicy::on_error().with_reinit().triggers().with_reinit);
        assert_eq!(RestartPolicy::Never.with_reinit(), RestartPolicy::Never);
        assert_eq!(
            RestartPolicy::StopAppOnFail.with_reinit(),
            RestartPolicy::StopAppOnFail
        );
    }

    #[test]
    fn stop_app_is_not_a_trigger_policy() {
        let policy = RestartPolicy::StopAppOnFail;
        assert!(policy.stops_app());
        let triggers = policy.triggers();
        assert!(!triggers.on_panic && !triggers.on_error);
    }
}
