//! Integration test common infrastructure.
//!
//! Provides utilities for spawning relay processes and driving WebSocket
//! clients against them.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::{TestServer, TestServerOptions};
