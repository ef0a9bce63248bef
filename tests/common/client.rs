//! Test WebSocket client.
//!
//! Sends raw or typed frames and asserts on what the relay pushes back.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use yapple_proto::Frame;

/// Time given to the relay to process a frame that produces no reply.
pub const SETTLE: Duration = Duration::from_millis(150);

/// A test WebSocket client.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Open a socket to the relay.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (ws, _) = connect_async(url).await?;
        Ok(Self { ws })
    }

    /// Send raw text as one WebSocket message.
    pub async fn send_raw(&mut self, text: &str) -> anyhow::Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a binary WebSocket message.
    pub async fn send_binary(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.ws.send(Message::Binary(data.to_vec())).await?;
        Ok(())
    }

    /// Send a typed frame.
    pub async fn send(&mut self, frame: &Frame) -> anyhow::Result<()> {
        self.send_raw(&frame.encode()).await
    }

    /// Send `connect` and give the relay time to register it.
    pub async fn announce(&mut self, user: &str) -> anyhow::Result<()> {
        self.send(&Frame::connect(user)?).await?;
        tokio::time::sleep(SETTLE).await;
        Ok(())
    }

    /// Send a chat message.
    pub async fn text(&mut self, from: &str, to: &str, content: &str) -> anyhow::Result<()> {
        self.send(&Frame::text(from, to, content)?).await
    }

    /// Receive the next text message as raw JSON.
    pub async fn recv_raw(&mut self) -> anyhow::Result<String> {
        self.recv_raw_timeout(Duration::from_secs(5)).await
    }

    /// Receive the next text message within `dur`.
    pub async fn recv_raw_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        loop {
            match timeout(dur, self.ws.next()).await? {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Close(_))) | None => anyhow::bail!("connection closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Receive and decode the next frame.
    pub async fn recv(&mut self) -> anyhow::Result<Frame> {
        let raw = self.recv_raw().await?;
        Frame::decode(&raw).map_err(|e| anyhow::anyhow!("bad frame {raw}: {e}"))
    }

    /// Assert nothing arrives for a short while.
    pub async fn expect_silence(&mut self) {
        if let Ok(text) = self.recv_raw_timeout(SETTLE * 2).await {
            panic!("expected no frame, got {text}");
        }
    }

    /// Close the socket cleanly.
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
