//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, RelayConfig)
//! - [`listen`]: WebSocket listener configuration (ListenConfig)
//! - [`history`]: Message persistence configuration (HistoryConfig, HistoryBackend)
//! - [`validation`]: Startup checks returning every problem at once

mod defaults;
mod history;
mod listen;
mod types;
mod validation;

pub use history::{HistoryBackend, HistoryConfig};
pub use listen::ListenConfig;
pub use types::{Config, ConfigError, DatabaseConfig, RelayConfig, ServerConfig};
pub use validation::validate;
