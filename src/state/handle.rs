//! Cheap, clonable handle to one live WebSocket connection.
//!
//! The handle never owns the socket. The connection task owns it and drains
//! the [`Outbound`] queue fed through [`ConnectionHandle::send`].

use crate::error::DeliveryError;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identifier, assigned in accept order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Readiness of a connection as seen by senders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Readiness {
    Open = 0,
    Closing = 1,
    Closed = 2,
}

impl Readiness {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Work queued for the task that owns the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Encoded text frame, shared across every recipient connection.
    Frame(Arc<str>),
    /// Close the socket.
    Close,
}

struct Inner {
    id: ConnectionId,
    addr: SocketAddr,
    state: AtomicU8,
    tx: mpsc::Sender<Outbound>,
}

#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<Inner>,
}

impl ConnectionHandle {
    /// Create a handle with an outbound queue of `capacity` entries.
    ///
    /// The receiver belongs to the task that owns the socket.
    pub fn new(addr: SocketAddr, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            inner: Arc::new(Inner {
                id: ConnectionId::next(),
                addr,
                state: AtomicU8::new(Readiness::Open as u8),
                tx,
            }),
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.inner.addr
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.readiness() == Readiness::Open
    }

    /// Queue an encoded frame without waiting.
    pub fn send(&self, text: Arc<str>) -> Result<(), DeliveryError> {
        if !self.is_open() {
            return Err(DeliveryError::NotOpen);
        }
        self.inner
            .tx
            .try_send(Outbound::Frame(text))
            .map_err(|err| match err {
                TrySendError::Full(_) => DeliveryError::QueueFull,
                TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }

    /// Move to `Closing` and ask the owning task to close the socket.
    ///
    /// Only the first call has any effect. The close request is best-effort:
    /// with a full queue the owning task still notices the state change
    /// after its next outbound frame.
    pub fn close(&self) {
        if self
            .inner
            .state
            .compare_exchange(
                Readiness::Open as u8,
                Readiness::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            let _ = self.inner.tx.try_send(Outbound::Close);
        }
    }

    /// Record that the socket is gone. Called by the owning task.
    pub fn mark_closed(&self) {
        self.inner
            .state
            .store(Readiness::Closed as u8, Ordering::Release);
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ConnectionHandle {}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.inner.id)
            .field("addr", &self.inner.addr)
            .field("readiness", &self.readiness())
            .finish()
    }
}
