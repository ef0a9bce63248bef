//! Connection lifecycle controller.
//!
//! Binds socket events to the codec, the registry and the fanout engine.
//! One [`Relay`] is built at startup and shared by every connection task.

mod session;

pub use session::{Phase, Session};

use crate::config::RelayConfig;
use crate::handlers::{DeliveryKind, DeliveryReport, Fanout};
use crate::history::MessageStore;
use crate::state::{ConnectionHandle, Registry};
use std::sync::Arc;
use tracing::{debug, info, warn};
use yapple_proto::{ErrorKind, Frame, UserId, ValidationError};

/// Behaviour switches for frame handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelayOptions {
    /// Queue an `error` frame back to the sender of an invalid frame.
    pub reply_on_invalid_frame: bool,
}

impl From<&RelayConfig> for RelayOptions {
    fn from(config: &RelayConfig) -> Self {
        Self {
            reply_on_invalid_frame: config.reply_on_invalid_frame,
        }
    }
}

/// What handling one inbound frame did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A `connect` registered the connection; `connections` is the user's
    /// live connection count afterwards.
    Registered { user: UserId, connections: usize },
    /// A `text` frame was relayed as a chat message.
    Relayed(DeliveryReport),
    /// A valid frame with no inbound handler, by type.
    Ignored(&'static str),
    /// The frame failed validation. The connection stays open.
    Rejected(ValidationError),
    /// The session had already closed.
    SessionClosed,
}

pub struct Relay {
    fanout: Fanout,
    options: RelayOptions,
}

impl Relay {
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<dyn MessageStore>,
        options: RelayOptions,
    ) -> Self {
        Self {
            fanout: Fanout::new(registry, store),
            options,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.fanout.registry()
    }

    /// The push path for in-process callers such as activity notifications.
    pub fn fanout(&self) -> &Fanout {
        &self.fanout
    }

    /// Start tracking a freshly accepted connection.
    pub fn open_session(&self, conn: ConnectionHandle) -> Session {
        debug!(conn_id = %conn.id(), addr = %conn.addr(), "Session opened");
        Session::new(conn)
    }

    /// Handle one inbound text frame.
    pub async fn on_frame(&self, session: &mut Session, raw: &str) -> FrameOutcome {
        if session.is_closed() {
            return FrameOutcome::SessionClosed;
        }

        let frame = match Frame::decode(raw) {
            Ok(frame) => frame,
            Err(err) => {
                self.reject(session, &err);
                return FrameOutcome::Rejected(err);
            }
        };
        crate::metrics::record_frame(frame.kind_name());

        match frame {
            Frame::Connect { client_id } => {
                let connections = self
                    .registry()
                    .register(client_id.clone(), session.conn().clone());
                session.record_connect(client_id.clone());
                info!(
                    user = %client_id,
                    conn_id = %session.conn().id(),
                    connections,
                    "Client registered"
                );
                FrameOutcome::Registered {
                    user: client_id,
                    connections,
                }
            }
            Frame::Text { from, to, content } => {
                let report = self
                    .fanout
                    .deliver(&from, &to, &content, DeliveryKind::Message)
                    .await;
                FrameOutcome::Relayed(report)
            }
            other => {
                let kind = other.kind_name();
                debug!(conn_id = %session.conn().id(), kind, "Ignoring frame with no inbound handler");
                FrameOutcome::Ignored(kind)
            }
        }
    }

    /// Handle a binary transport message. Frames are text only, so this is
    /// rejected exactly like a frame that fails to decode.
    pub fn on_binary(&self, session: &mut Session, len: usize) -> FrameOutcome {
        if session.is_closed() {
            return FrameOutcome::SessionClosed;
        }
        debug!(conn_id = %session.conn().id(), len, "Binary message received");
        let err = ValidationError::root(ErrorKind::NotText);
        self.reject(session, &err);
        FrameOutcome::Rejected(err)
    }

    /// Handle close or transport error. Idempotent.
    pub fn on_close(&self, session: &mut Session) {
        if session.is_closed() {
            return;
        }
        let removed = self.registry().unregister(session.conn());
        session.record_close();
        info!(
            conn_id = %session.conn().id(),
            users = removed.len(),
            "Connection closed"
        );
    }

    fn reject(&self, session: &Session, err: &ValidationError) {
        crate::metrics::record_rejected_frame(err.code());
        warn!(conn_id = %session.conn().id(), error = %err, "Dropping invalid frame");

        if !self.options.reply_on_invalid_frame {
            return;
        }
        let reply = Frame::Error {
            reason: err.to_string(),
        };
        if let Err(e) = session.conn().send(Arc::from(reply.encode())) {
            debug!(conn_id = %session.conn().id(), error = %e, "Could not send error reply");
        }
    }
}
