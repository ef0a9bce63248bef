//! State management module.
//!
//! Contains the per-connection handle and the process-wide registry that
//! maps each user to their live connections.

mod handle;
mod registry;

pub use handle::{ConnectionHandle, ConnectionId, Outbound, Readiness};
pub use registry::Registry;
