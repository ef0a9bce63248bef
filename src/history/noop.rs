//! No-op message store that discards all messages.
//!
//! Used when persistence is disabled. All operations succeed but store nothing.

use super::{MessageStore, PersistedMessage, StorageError};
use async_trait::async_trait;
use std::time::Duration;
use yapple_proto::UserId;

pub struct NoOpStore;

#[async_trait]
impl MessageStore for NoOpStore {
    async fn create(
        &self,
        to: &UserId,
        from: &UserId,
        content: &str,
    ) -> Result<PersistedMessage, StorageError> {
        Ok(PersistedMessage::new(to, from, content))
    }

    async fn find(&self, _id: &str) -> Result<Option<PersistedMessage>, StorageError> {
        Ok(None)
    }

    async fn list_all(&self) -> Result<Vec<PersistedMessage>, StorageError> {
        Ok(vec![])
    }

    async fn between(
        &self,
        _a: &UserId,
        _b: &UserId,
    ) -> Result<Vec<PersistedMessage>, StorageError> {
        Ok(vec![])
    }

    async fn delete(&self, _id: &str) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn prune(&self, _retention: Duration) -> Result<usize, StorageError> {
        Ok(0)
    }
}
