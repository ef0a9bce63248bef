//! Chat message persistence.
//!
//! Relayed chat messages are written through [`MessageStore`]. The fanout
//! path only ever calls [`MessageStore::create`]; the remaining operations
//! serve conversation history and maintenance.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use yapple_proto::UserId;

use crate::config::{DatabaseConfig, HistoryBackend, HistoryConfig};
use crate::db::{Database, DbError};

pub mod noop;
pub mod redb;
pub mod sqlite;
pub mod types;

pub use types::PersistedMessage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<DbError> for StorageError {
    fn from(err: DbError) -> Self {
        StorageError::Database(err.to_string())
    }
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message stamped with a fresh id and the current time.
    async fn create(
        &self,
        to: &UserId,
        from: &UserId,
        content: &str,
    ) -> Result<PersistedMessage, StorageError>;

    /// Fetch one message by id.
    async fn find(&self, id: &str) -> Result<Option<PersistedMessage>, StorageError>;

    /// Every stored message, oldest first.
    async fn list_all(&self) -> Result<Vec<PersistedMessage>, StorageError>;

    /// Messages exchanged between `a` and `b` in either direction, oldest first.
    async fn between(&self, a: &UserId, b: &UserId)
    -> Result<Vec<PersistedMessage>, StorageError>;

    /// Remove one message. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool, StorageError>;

    /// Remove messages older than `retention` (Maintenance).
    async fn prune(&self, retention: Duration) -> Result<usize, StorageError>;
}

/// Open the store selected by `history.backend`.
pub async fn open(
    history: &HistoryConfig,
    database: &DatabaseConfig,
) -> Result<Arc<dyn MessageStore>, StorageError> {
    let store: Arc<dyn MessageStore> = match history.effective_backend() {
        HistoryBackend::Sqlite => {
            info!(path = %database.path, "Initializing SQLite message store");
            let db = Database::new(&database.path).await?;
            Arc::new(sqlite::SqliteStore::new(db))
        }
        HistoryBackend::Redb => {
            info!(path = %history.path, "Initializing Redb message store");
            Arc::new(redb::RedbStore::new(&history.path)?)
        }
        HistoryBackend::None => {
            info!("Message persistence disabled. Using NoOp store.");
            Arc::new(noop::NoOpStore)
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_none_backend_discards_messages() {
        let history = HistoryConfig {
            backend: HistoryBackend::None,
            ..Default::default()
        };
        let store = open(&history, &DatabaseConfig::default()).await.unwrap();
        let a = UserId::new("u1").unwrap();
        let b = UserId::new("u2").unwrap();
        store.create(&b, &a, "hey").await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_redb_backend_uses_history_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.redb");
        let history = HistoryConfig {
            backend: HistoryBackend::Redb,
            path: path.to_string_lossy().into_owned(),
            ..Default::default()
        };
        let store = open(&history, &DatabaseConfig::default()).await.unwrap();
        let a = UserId::new("u1").unwrap();
        let b = UserId::new("u2").unwrap();
        store.create(&b, &a, "hey").await.unwrap();
        assert_eq!(store.between(&a, &b).await.unwrap().len(), 1);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn open_sqlite_backend_uses_database_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.db");
        let database = DatabaseConfig {
            path: path.to_string_lossy().into_owned(),
        };
        let store = open(&HistoryConfig::default(), &database).await.unwrap();
        let a = UserId::new("u1").unwrap();
        let b = UserId::new("u2").unwrap();
        let saved = store.create(&b, &a, "hey").await.unwrap();
        assert_eq!(store.find(&saved.id).await.unwrap(), Some(saved));
    }
}
