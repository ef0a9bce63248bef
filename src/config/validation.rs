//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::{Config, HistoryBackend};
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("listen.max_frame_bytes must be greater than zero")]
    ZeroFrameLimit,
    #[error("listen.outbound_queue must be greater than zero")]
    ZeroOutboundQueue,
    #[error("listen.allow_origins contains an empty entry")]
    EmptyOrigin,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
    #[error("history.path parent directory does not exist: {0}")]
    HistoryPathInvalid(String),
    #[error("history.retention_days must be greater than zero")]
    ZeroRetention,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    if config.listen.max_frame_bytes == 0 {
        errors.push(ValidationError::ZeroFrameLimit);
    }
    if config.listen.outbound_queue == 0 {
        errors.push(ValidationError::ZeroOutboundQueue);
    }
    if config.listen.allow_origins.iter().any(|o| o.is_empty()) {
        errors.push(ValidationError::EmptyOrigin);
    }

    match config.history.effective_backend() {
        HistoryBackend::Sqlite if !parent_exists(&config.database.path) => {
            errors.push(ValidationError::DatabasePathInvalid(
                config.database.path.clone(),
            ));
        }
        HistoryBackend::Redb if !parent_exists(&config.history.path) => {
            errors.push(ValidationError::HistoryPathInvalid(
                config.history.path.clone(),
            ));
        }
        _ => {}
    }

    if config.history.retention_days == Some(0) {
        errors.push(ValidationError::ZeroRetention);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn parent_exists(path: &str) -> bool {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.exists(),
        _ => true,
    }
}
