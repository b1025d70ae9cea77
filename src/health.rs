//! # Health-check entities for the management socket.
//!
//! [`AppInfo`] identifies the application build; [`StateInfo`] is the
//! payload of the built-in `status` action: the app info plus the current
//! state of every worker.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::workers::{WorkerName, WorkerState};

/// Name of the built-in status action: returns [`StateInfo`].
pub const STATUS_ACTION: &str = "status";
/// Name of the built-in ping action: returns `"pong"`.
pub const PING_ACTION: &str = "ping";

/// Details of the application build.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub build: String,
    pub tag: String,
}

impl AppInfo {
    /// Path of the management socket derived from the application name.
    pub fn socket_path(&self) -> PathBuf {
        PathBuf::from(format!("/tmp/_uwe_{}.socket", self.name))
    }
}

/// Result of the `status` action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateInfo {
    /// Application build details.
    pub app: AppInfo,
    /// Current state of every registered worker.
    pub workers: BTreeMap<WorkerName, WorkerState>,
}

impl StateInfo {
    /// Decodes a `StateInfo` from the `data` of a `status` response.
    pub fn parse(data: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_is_derived_from_app_name() {
        let app = AppInfo {
            name: "billing".into(),
            ..AppInfo::default()
        };
        assert_eq!(
            app.socket_path(),
            PathBuf::from("/tmp/_uwe_billing.socket")
        );
    }

    #[test]
    fn state_info_parses_the_wire_shape() {
        let data = serde_json::json!({
            "app": {"name": "svc", "version": "1.2.3", "build": "abc", "tag": "rc1"},
            "workers": {"api": "Running", "cron": "Stopped"},
        });
        let info = StateInfo::parse(data).unwrap();
        assert_eq!(info.app.name, "svc");
        assert_eq!(
            info.workers[&WorkerName::from("api")],
            WorkerState::Running
        );
        assert_eq!(
            info.workers[&WorkerName::from("cron")],
            WorkerState::Stopped
        );
    }
}
