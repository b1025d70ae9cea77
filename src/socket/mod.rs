//! Local management socket: JSON command server and one-shot client.

mod client;
mod entities;
mod server;

pub use client::SocketClient;
pub use entities::{
    Action, ActionFn, Request, Response, STATUS_ERR, STATUS_INTERNAL_ERR, STATUS_OK,
};
pub use server::SocketServer;
