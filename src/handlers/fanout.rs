//! Push one message to every live connection of one recipient.

use crate::history::MessageStore;
use crate::state::Registry;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use yapple_proto::{Frame, UserId};

/// What is being delivered, which decides persistence and wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// Durable chat message: persisted, pushed as a `message` frame.
    Message,
    /// Transient notification: not persisted, pushed as a `text` frame.
    Text,
}

impl DeliveryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for DeliveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one [`Fanout::deliver`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// `Some(stored)` for chat messages, `None` when nothing was persisted.
    pub persisted: Option<bool>,
    /// Open connections a send was attempted on.
    pub attempted: usize,
    /// Sends that were queued.
    pub delivered: usize,
    /// Sends that failed.
    pub failed: usize,
}

impl DeliveryReport {
    /// True if the recipient had no open connection.
    pub fn recipient_offline(&self) -> bool {
        self.attempted == 0
    }
}

/// The fanout engine. Stateless apart from the shared registry and store.
pub struct Fanout {
    registry: Arc<Registry>,
    store: Arc<dyn MessageStore>,
}

impl Fanout {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn MessageStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    /// Deliver `content` from `from` to every live connection of `to`.
    ///
    /// Content that would not make a valid frame is refused before anything
    /// is stored or sent. Chat messages are persisted first; a storage failure
    /// is logged and delivery continues. Individual send failures are logged
    /// and never stop delivery to the recipient's other connections.
    pub async fn deliver(
        &self,
        from: &UserId,
        to: &UserId,
        content: &str,
        kind: DeliveryKind,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let frame = match kind {
            DeliveryKind::Message => Frame::message(from.as_str(), content),
            DeliveryKind::Text => Frame::text(from.as_str(), to.as_str(), content),
        };
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                crate::metrics::record_rejected_frame(e.code());
                warn!(from = %from, to = %to, kind = %kind, error = %e, "Refusing to deliver invalid frame");
                return report;
            }
        };

        if kind == DeliveryKind::Message {
            match self.store.create(to, from, content).await {
                Ok(saved) => {
                    debug!(id = %saved.id, from = %from, to = %to, "Message persisted");
                    report.persisted = Some(true);
                }
                Err(e) => {
                    warn!(from = %from, to = %to, error = %e, "Failed to persist message");
                    crate::metrics::record_storage_error();
                    report.persisted = Some(false);
                }
            }
        }

        let connections = self.registry.lookup(to.as_str());
        let encoded: Arc<str> = Arc::from(frame.encode());

        for conn in connections.iter().filter(|c| c.is_open()) {
            report.attempted += 1;
            match conn.send(Arc::clone(&encoded)) {
                Ok(()) => {
                    report.delivered += 1;
                    crate::metrics::record_delivered();
                }
                Err(e) => {
                    report.failed += 1;
                    crate::metrics::record_send_failure(e.error_code());
                    warn!(conn_id = %conn.id(), to = %to, error = %e, "Send to connection failed");
                }
            }
        }

        crate::metrics::record_delivery(kind.as_str(), report.attempted);
        if report.recipient_offline() {
            info!(from = %from, to = %to, kind = %kind, "Recipient not connected");
        } else {
            debug!(
                from = %from,
                to = %to,
                kind = %kind,
                delivered = report.delivered,
                failed = report.failed,
                "Delivered"
            );
        }

        report
    }
}
