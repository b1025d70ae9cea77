//! Wire entities of the management-socket protocol.
//!
//! One JSON [`Request`] and one JSON [`Response`] per connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command was successfully processed.
pub const STATUS_OK: i32 = 0;
/// Command was not processed; check [`Response::error`] for details.
pub const STATUS_ERR: i32 = 13;
/// Command was not sent, or encoding of the response failed.
pub const STATUS_INTERNAL_ERR: i32 = -1;

/// Specified handler of a socket command.
pub type ActionFn = Box<dyn Fn(Request) -> Response + Send + Sync + 'static>;

/// A pair of command name and command handler.
pub struct Action {
    pub(crate) name: String,
    pub(crate) handler: ActionFn,
}

impl Action {
    /// Creates a named action.
    pub fn new(
        name: impl Into<String>,
        handler: impl Fn(Request) -> Response + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            handler: Box::new(handler),
        }
    }

    /// Command name this action answers to.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A pair of command name and command arguments.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    /// Command name.
    #[serde(rename = "ActionFunc")]
    pub action: String,
    /// Raw command arguments.
    #[serde(default)]
    pub args: Value,
}

/// Result of executing a command handler.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    /// One of [`STATUS_OK`], [`STATUS_ERR`], [`STATUS_INTERNAL_ERR`].
    pub status: i32,
    /// Error details for non-ok statuses.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    /// Action result payload.
    #[serde(default)]
    pub data: Value,
}

impl Response {
    /// An ok response carrying `data`.
    ///
    /// A payload that cannot be serialized yields an internal-error
    /// response instead.
    pub fn ok(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                status: STATUS_OK,
                error: String::new(),
                data: value,
            },
            Err(err) => Self::internal(err.to_string()),
        }
    }

    /// An action-level error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERR,
            error: error.into(),
            data: Value::Null,
        }
    }

    /// An internal (encoding) error response.
    pub fn internal(error: impl Into<String>) -> Self {
        Self {
            status: STATUS_INTERNAL_ERR,
            error: error.into(),
            data: Value::Null,
        }
    }

    pub(crate) fn unknown_action() -> Self {
        Self::err("unknown_action")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_the_wire_field_names() {
        let req: Request =
            serde_json::from_str(r#"{"ActionFunc": "status", "args": {"verbose": true}}"#).unwrap();
        assert_eq!(req.action, "status");
        assert_eq!(req.args["verbose"], true);
    }

    #[test]
    fn args_default_to_null() {
        let req: Request = serde_json::from_str(r#"{"ActionFunc": "ping"}"#).unwrap();
        assert!(req.args.is_null());
    }

    #[test]
    fn ok_response_carries_data() {
        let resp = Response::ok("pong");
        assert_eq!(resp.status, STATUS_OK);
        assert_eq!(resp.data, "pong");
        let encoded = serde_json::to_string(&resp).unwrap();
        // empty error is omitted on the wire
        assert!(!encoded.contains("error"));
    }

    #[test]
    fn unknown_action_is_an_action_level_error() {
        let resp = Response::unknown_action();
        assert_eq!(resp.status, STATUS_ERR);
        assert_eq!(resp.error, "unknown_action");
    }
}
