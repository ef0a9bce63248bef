//! Redb-backed persistent message storage.
//!
//! Implements [`MessageStore`] using the redb embedded database. Records are
//! JSON-encoded and keyed by id; a second table keys the same records by
//! conversation and time so history reads are a single range scan.

use super::types::retention_cutoff;
use super::{MessageStore, PersistedMessage, StorageError};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use yapple_proto::UserId;

const MESSAGES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");
const CONVERSATION_INDEX: TableDefinition<&str, &[u8]> = TableDefinition::new("conversations");
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_SEQ_KEY: &str = "next_seq";

/// On-disk shape of one message.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    to: String,
    from: String,
    content: String,
    created_at: i64,
    /// Insertion order, breaks ties between messages in the same millisecond.
    #[serde(default)]
    seq: u64,
}

impl StoredRecord {
    fn from_message(msg: &PersistedMessage, seq: u64) -> Self {
        Self {
            id: msg.id.clone(),
            to: msg.to.to_string(),
            from: msg.from.to_string(),
            content: msg.content.clone(),
            created_at: msg.created_at_millis(),
            seq,
        }
    }

    fn into_message(self) -> Result<PersistedMessage, StorageError> {
        PersistedMessage::from_parts(self.id, self.to, self.from, self.content, self.created_at)
    }

    fn conversation_key(&self) -> String {
        format!(
            "{}{:020}:{:020}:{}",
            conversation(&self.from, &self.to),
            self.created_at,
            self.seq,
            self.id
        )
    }
}

/// Direction-independent conversation prefix.
///
/// Each id is length-prefixed, so no two pairs share a prefix whatever
/// characters the ids contain.
fn conversation(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{}:{lo}{}:{hi}|", lo.len(), hi.len())
}

fn db_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Database(e.to_string())
}

fn decode(bytes: &[u8]) -> Result<StoredRecord, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let db = Database::create(path).map_err(db_err)?;

        // Create both tables up front so read transactions never miss them.
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            write_txn.open_table(MESSAGES_TABLE).map_err(db_err)?;
            write_txn.open_table(CONVERSATION_INDEX).map_err(db_err)?;
            write_txn.open_table(META_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn remove_records(&self, records: &[StoredRecord]) -> Result<usize, StorageError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let mut count = 0;
        {
            let mut table = write_txn.open_table(MESSAGES_TABLE).map_err(db_err)?;
            let mut index = write_txn.open_table(CONVERSATION_INDEX).map_err(db_err)?;
            for record in records {
                if table.remove(record.id.as_str()).map_err(db_err)?.is_some() {
                    count += 1;
                }
                index
                    .remove(record.conversation_key().as_str())
                    .map_err(db_err)?;
            }
        }
        write_txn.commit().map_err(db_err)?;
        Ok(count)
    }
}

#[async_trait]
impl MessageStore for RedbStore {
    async fn create(
        &self,
        to: &UserId,
        from: &UserId,
        content: &str,
    ) -> Result<PersistedMessage, StorageError> {
        let msg = PersistedMessage::new(to, from, content);

        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut meta = write_txn.open_table(META_TABLE).map_err(db_err)?;
            let seq = meta
                .get(NEXT_SEQ_KEY)
                .map_err(db_err)?
                .map(|v| v.value())
                .unwrap_or(0);
            meta.insert(NEXT_SEQ_KEY, seq + 1).map_err(db_err)?;

            let record = StoredRecord::from_message(&msg, seq);
            let value = serde_json::to_vec(&record)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;

            let mut table = write_txn.open_table(MESSAGES_TABLE).map_err(db_err)?;
            table
                .insert(record.id.as_str(), value.as_slice())
                .map_err(db_err)?;

            let mut index = write_txn.open_table(CONVERSATION_INDEX).map_err(db_err)?;
            index
                .insert(record.conversation_key().as_str(), value.as_slice())
                .map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(msg)
    }

    async fn find(&self, id: &str) -> Result<Option<PersistedMessage>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(MESSAGES_TABLE).map_err(db_err)?;
        match table.get(id).map_err(db_err)? {
            Some(v) => decode(v.value())?.into_message().map(Some),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<PersistedMessage>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(MESSAGES_TABLE).map_err(db_err)?;

        let mut records = Vec::new();
        for item in table.iter().map_err(db_err)? {
            let (_k, v) = item.map_err(db_err)?;
            records.push(decode(v.value())?);
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.seq.cmp(&b.seq)));
        records.into_iter().map(StoredRecord::into_message).collect()
    }

    async fn between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Vec<PersistedMessage>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let index = read_txn.open_table(CONVERSATION_INDEX).map_err(db_err)?;

        let start_key = conversation(a.as_str(), b.as_str());
        let end_key = format!("{start_key}\u{FFFF}");

        let mut messages = Vec::new();
        for item in index
            .range(start_key.as_str()..end_key.as_str())
            .map_err(db_err)?
        {
            let (_k, v) = item.map_err(db_err)?;
            messages.push(decode(v.value())?.into_message()?);
        }
        Ok(messages)
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let record = {
            let read_txn = self.db.begin_read().map_err(db_err)?;
            let table = read_txn.open_table(MESSAGES_TABLE).map_err(db_err)?;
            match table.get(id).map_err(db_err)? {
                Some(v) => decode(v.value())?,
                None => return Ok(false),
            }
        };
        Ok(self.remove_records(&[record])? > 0)
    }

    async fn prune(&self, retention: Duration) -> Result<usize, StorageError> {
        let cutoff = retention_cutoff(retention);

        let expired = {
            let read_txn = self.db.begin_read().map_err(db_err)?;
            let table = read_txn.open_table(MESSAGES_TABLE).map_err(db_err)?;
            let mut expired = Vec::new();
            for item in table.iter().map_err(db_err)? {
                let (_k, v) = item.map_err(db_err)?;
                let record = decode(v.value())?;
                if record.created_at < cutoff {
                    expired.push(record);
                }
            }
            expired
        };

        if expired.is_empty() {
            return Ok(0);
        }
        self.remove_records(&expired)
    }
}
