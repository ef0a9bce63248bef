//! Connection - Handles one upgraded WebSocket.
//!
//! Each Connection runs in its own Tokio task. A single `tokio::select!`
//! loop multiplexes inbound frames (handed to the [`Relay`] one at a time)
//! with the outbound queue fed by the fanout engine.

use crate::relay::Relay;
use crate::state::{ConnectionHandle, Outbound};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{Instrument, debug, info};

/// A client connection handler.
pub struct Connection {
    ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    relay: Arc<Relay>,
    outbound_queue: usize,
}

impl Connection {
    pub fn new(
        ws: WebSocketStream<TcpStream>,
        addr: SocketAddr,
        relay: Arc<Relay>,
        outbound_queue: usize,
    ) -> Self {
        Self {
            ws,
            addr,
            relay,
            outbound_queue,
        }
    }

    /// Run the connection until the peer closes, the transport fails, or the
    /// registry asks for the socket to be closed.
    pub async fn run(self) -> Result<(), WsError> {
        let (handle, outbound) = ConnectionHandle::new(self.addr, self.outbound_queue);
        let span = crate::telemetry::spans::connection(handle.id(), self.addr);
        self.event_loop(handle, outbound).instrument(span).await
    }

    async fn event_loop(
        self,
        handle: ConnectionHandle,
        mut outbound: tokio::sync::mpsc::Receiver<Outbound>,
    ) -> Result<(), WsError> {
        let Self { ws, relay, .. } = self;
        let (mut sink, mut stream) = ws.split();
        let mut session = relay.open_session(handle.clone());
        crate::metrics::adjust_open_connections(1);

        info!("Entering connection loop");

        let result = loop {
            tokio::select! {
                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        relay.on_frame(&mut session, &text).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        relay.on_binary(&mut session, data.len());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "Peer closed");
                        break Ok(());
                    }
                    // Ping/pong are answered by tungstenite.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(e),
                    None => break Ok(()),
                },

                Some(item) = outbound.recv() => match item {
                    Outbound::Frame(text) => {
                        if let Err(e) = sink.send(Message::Text(text.to_string())).await {
                            break Err(e);
                        }
                        // A close request may have been dropped on a full queue.
                        if !handle.is_open() {
                            break Ok(());
                        }
                    }
                    Outbound::Close => {
                        debug!("Close requested by registry");
                        break Ok(());
                    }
                },
            }
        };

        relay.on_close(&mut session);
        handle.mark_closed();
        crate::metrics::adjust_open_connections(-1);

        // Completes the close handshake where the socket is still usable.
        let _ = sink.close().await;

        result
    }
}
