//! Gateway - TCP listener that upgrades incoming connections to WebSocket.
//!
//! The Gateway binds the listen socket and spawns a Connection task for each
//! client whose `Origin` passes the allow list.

use crate::config::ListenConfig;
use crate::network::Connection;
use crate::relay::Relay;
use http::StatusCode;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{error, info, instrument, warn};

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    config: Arc<ListenConfig>,
    relay: Arc<Relay>,
}

impl Gateway {
    /// Bind the gateway to `config.address`.
    pub async fn bind(config: ListenConfig, relay: Arc<Relay>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.address).await?;
        info!(address = %listener.local_addr()?, "WebSocket listener bound");
        Ok(Self {
            listener,
            config: Arc::new(config),
            relay,
        })
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "WebSocket connection attempt");
                    let config = Arc::clone(&self.config);
                    let relay = Arc::clone(&self.relay);
                    tokio::spawn(async move {
                        handle_stream(stream, addr, config, relay).await;
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

fn ws_config(config: &ListenConfig) -> WebSocketConfig {
    let mut ws = WebSocketConfig::default();
    ws.max_message_size = Some(config.max_frame_bytes);
    ws.max_frame_size = Some(config.max_frame_bytes);
    ws
}

fn forbidden() -> ErrorResponse {
    let mut response = ErrorResponse::new(Some("Origin not allowed".to_string()));
    *response.status_mut() = StatusCode::FORBIDDEN;
    response
}

async fn handle_stream(
    stream: TcpStream,
    addr: SocketAddr,
    config: Arc<ListenConfig>,
    relay: Arc<Relay>,
) {
    let origin_check = |req: &Request, response: Response| {
        let origin = req
            .headers()
            .get("Origin")
            .and_then(|o| o.to_str().ok());
        if config.origin_allowed(origin) {
            Ok(response)
        } else {
            warn!(%addr, origin = ?origin, "WebSocket origin rejected");
            Err(forbidden())
        }
    };

    match accept_hdr_async_with_config(stream, origin_check, Some(ws_config(&config))).await {
        Ok(ws_stream) => {
            info!(%addr, "WebSocket handshake successful");
            let connection = Connection::new(ws_stream, addr, relay, config.outbound_queue);
            if let Err(e) = connection.run().await {
                warn!(%addr, error = %e, "WebSocket connection error");
            }
            info!(%addr, "WebSocket connection closed");
        }
        Err(e) => {
            warn!(%addr, error = %e, "WebSocket handshake failed");
        }
    }
}
