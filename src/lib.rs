//! yapple-relay - real-time relay for the Yapple social platform.
//!
//! Keeps a per-user registry of live WebSocket connections and pushes
//! direct messages and activity notifications to every open session.
//! The binary wires these pieces together; the library is also used by
//! in-process callers that emit notifications through [`handlers::Fanout`].

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod history;
pub mod http;
pub mod metrics;
pub mod network;
pub mod relay;
pub mod state;
pub mod telemetry;
