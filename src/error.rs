//! Unified error handling for yapple-relay.
//!
//! Frame validation errors live in `yapple_proto`, persistence errors in
//! [`crate::history`]. This module holds the errors raised while pushing
//! frames to live connections.

use thiserror::Error;

// ============================================================================
// Delivery Errors (per-connection sends)
// ============================================================================

/// A frame could not be queued to one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The connection's outbound queue is at capacity.
    #[error("outbound queue full")]
    QueueFull,

    /// The task owning the socket has gone away.
    #[error("connection task has exited")]
    Closed,

    /// The connection is closing or closed.
    #[error("connection is not open")]
    NotOpen,
}

impl DeliveryError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::QueueFull => "queue_full",
            Self::Closed => "closed",
            Self::NotOpen => "not_open",
        }
    }
}
