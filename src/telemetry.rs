//! Logging setup and standard spans.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Standardized span constructors.
pub mod spans {
    use crate::state::ConnectionId;
    use std::net::SocketAddr;
    use tracing::{Span, info_span};

    /// Span wrapping one connection task.
    pub fn connection(conn_id: ConnectionId, addr: SocketAddr) -> Span {
        info_span!("connection", conn_id = %conn_id, addr = %addr)
    }

    /// Span wrapping a maintenance pass over the message store.
    pub fn maintenance(task: &'static str) -> Span {
        info_span!("maintenance", task)
    }
}
