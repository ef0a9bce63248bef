//! Network module.
//!
//! Contains the Gateway (TCP listener + WebSocket upgrade) and the
//! per-connection task.

mod connection;
mod gateway;

pub use connection::Connection;
pub use gateway::Gateway;
