//! SQLite-backed message store on the shared [`Database`] pool.

use super::types::retention_cutoff;
use super::{MessageStore, PersistedMessage, StorageError};
use crate::db::{Database, MessageRow};
use async_trait::async_trait;
use std::time::Duration;
use yapple_proto::UserId;

pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn to_message(row: MessageRow) -> Result<PersistedMessage, StorageError> {
    PersistedMessage::from_parts(row.id, row.recipient, row.sender, row.content, row.created_at)
}

fn to_messages(rows: Vec<MessageRow>) -> Result<Vec<PersistedMessage>, StorageError> {
    rows.into_iter().map(to_message).collect()
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn create(
        &self,
        to: &UserId,
        from: &UserId,
        content: &str,
    ) -> Result<PersistedMessage, StorageError> {
        let msg = PersistedMessage::new(to, from, content);
        self.db
            .messages()
            .insert(&MessageRow {
                id: msg.id.clone(),
                recipient: msg.to.to_string(),
                sender: msg.from.to_string(),
                content: msg.content.clone(),
                created_at: msg.created_at_millis(),
            })
            .await?;
        Ok(msg)
    }

    async fn find(&self, id: &str) -> Result<Option<PersistedMessage>, StorageError> {
        self.db.messages().find(id).await?.map(to_message).transpose()
    }

    async fn list_all(&self) -> Result<Vec<PersistedMessage>, StorageError> {
        to_messages(self.db.messages().list_all().await?)
    }

    async fn between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Vec<PersistedMessage>, StorageError> {
        to_messages(self.db.messages().between(a.as_str(), b.as_str()).await?)
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.db.messages().delete(id).await?)
    }

    async fn prune(&self, retention: Duration) -> Result<usize, StorageError> {
        Ok(self
            .db
            .messages()
            .prune_before(retention_cutoff(retention))
            .await?)
    }
}
