//! # Management-socket client.
//!
//! Performs one request/response exchange per call, matching the server's
//! framing: write the JSON request, shut down the write half, read the
//! JSON response until EOF.

use std::io;
use std::path::PathBuf;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use crate::error::RuntimeError;
use crate::health::{StateInfo, PING_ACTION, STATUS_ACTION};
use crate::socket::entities::{Request, Response};

/// Client for a supervisor's management socket.
///
/// ```rust,no_run
/// use foreman::socket::SocketClient;
///
/// # async fn check() -> Result<(), foreman::RuntimeError> {
/// let client = SocketClient::new("/tmp/_uwe_billing.socket");
/// if !client.ping().await? {
///     std::process::exit(1);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SocketClient {
    path: PathBuf,
}

impl SocketClient {
    /// Creates a client for the socket at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sends one command and returns the decoded response.
    pub async fn call(&self, action: &str, args: Value) -> Result<Response, RuntimeError> {
        let mut stream = UnixStream::connect(&self.path).await?;

        let request = Request {
            action: action.to_owned(),
            args,
        };
        let encoded = serde_json::to_vec(&request)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;
        let response = serde_json::from_slice(&raw)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Ok(response)
    }

    /// Runs the built-in ping action; true when the server answered "pong".
    pub async fn ping(&self) -> Result<bool, RuntimeError> {
        let response = self.call(PING_ACTION, Value::Null).await?;
        Ok(response.data == "pong")
    }

    /// Runs the built-in status action and decodes the worker states.
    pub async fn status(&self) -> Result<StateInfo, RuntimeError> {
        let response = self.call(STATUS_ACTION, Value::Null).await?;
        let info = StateInfo::parse(response.data)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Ok(info)
    }
}
