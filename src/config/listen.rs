//! WebSocket listener configuration.

use serde::Deserialize;
use std::net::SocketAddr;

use super::defaults::{default_max_frame_bytes, default_outbound_queue};

/// WebSocket listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:3001").
    pub address: SocketAddr,
    /// Allowed origins for the upgrade request (e.g., `["https://yapple.app"]`).
    /// Empty list allows all origins.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    /// Largest inbound message in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Per-connection outbound queue depth.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl ListenConfig {
    /// Check an `Origin` header value against the allow list.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allow_origins.is_empty() {
            return true;
        }
        match origin {
            Some(origin) => self.allow_origins.iter().any(|a| a == origin || a == "*"),
            None => self.allow_origins.iter().any(|a| a == "*"),
        }
    }
}
