//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "yapple-relay".to_string()
}

/// Used when `server.metrics_port` is not set.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

// =============================================================================
// Listener Defaults
// =============================================================================

/// Largest inbound WebSocket message accepted (64 KiB).
pub fn default_max_frame_bytes() -> usize {
    64 * 1024
}

/// Outbound frames buffered per connection before sends start failing.
pub fn default_outbound_queue() -> usize {
    256
}

// =============================================================================
// Persistence Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "yapple.db".to_string()
}

pub fn default_history_path() -> String {
    "history.redb".to_string()
}
