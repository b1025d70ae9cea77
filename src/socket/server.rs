//! # Management-socket server.
//!
//! Opens a unix domain socket with mode `0700` and answers commands in
//! JSON format: per connection, one [`Request`] in, one [`Response`] out,
//! then the connection is closed. The client signals the end of its
//! request by shutting down its write half.

use std::collections::HashMap;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::socket::entities::{Action, Request, Response};

/// Handler that listens on a unix socket, accepts commands, and writes
/// responses in JSON format.
pub struct SocketServer {
    path: PathBuf,
    handlers: HashMap<String, Action>,
}

impl SocketServer {
    /// Creates a new server with some actions.
    pub fn new(path: impl Into<PathBuf>, actions: Vec<Action>) -> Self {
        let mut handlers = HashMap::new();
        for action in actions {
            handlers.insert(action.name.clone(), action);
        }
        Self {
            path: path.into(),
            handlers,
        }
    }

    /// Adds a new or replaces an existing command handler.
    pub fn set_action(&mut self, action: Action) {
        self.handlers.insert(action.name.clone(), action);
    }

    /// Path the server binds to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Binds the socket and serves commands until `token` is cancelled.
    ///
    /// A stale socket file from a previous run is removed before binding,
    /// and the file is removed again on the way out. Per-connection
    /// failures are logged and do not stop the server.
    pub async fn serve(self, token: CancellationToken) -> Result<(), RuntimeError> {
        remove_stale(&self.path)?;
        let listener = UnixListener::bind(&self.path)?;
        std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o700))?;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        if let Err(err) = self.process(stream).await {
                            tracing::warn!(error = %err, "service socket request failed");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "service socket accept failed");
                    }
                },
            }
        }

        remove_stale(&self.path)?;
        Ok(())
    }

    async fn process(&self, mut stream: UnixStream) -> io::Result<()> {
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;
        let request: Request = serde_json::from_slice(&raw)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let response = match self.handlers.get(&request.action) {
            Some(action) => (action.handler)(request),
            None => Response::unknown_action(),
        };

        let encoded = serde_json::to_vec(&response)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;
        Ok(())
    }
}

fn remove_stale(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
