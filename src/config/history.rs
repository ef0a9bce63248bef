//! Message persistence configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{default_history_path, default_true};

/// Which store backs relayed chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    /// SQLite through the shared `[database]` pool.
    #[default]
    Sqlite,
    /// Embedded redb file at `history.path`.
    Redb,
    /// Discard everything.
    None,
}

/// Message persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Whether chat messages are persisted at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Backend type: "sqlite", "redb", "none".
    #[serde(default)]
    pub backend: HistoryBackend,
    /// Path to the redb file (ignored by the other backends).
    #[serde(default = "default_history_path")]
    pub path: String,
    /// Delete messages older than this many days. Unset keeps messages
    /// until they are explicitly deleted.
    #[serde(default)]
    pub retention_days: Option<u32>,
}

impl HistoryConfig {
    /// Backend actually in effect once `enabled` is taken into account.
    pub fn effective_backend(&self) -> HistoryBackend {
        if self.enabled {
            self.backend
        } else {
            HistoryBackend::None
        }
    }

    /// Retention window, if pruning is configured.
    pub fn retention(&self) -> Option<Duration> {
        self.retention_days
            .map(|days| Duration::from_secs(u64::from(days) * 24 * 60 * 60))
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: HistoryBackend::default(),
            path: default_history_path(),
            retention_days: None,
        }
    }
}
