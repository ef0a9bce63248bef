//! Message repository for relayed chat messages.

use super::DbError;
use sqlx::SqlitePool;

/// Row tuple as selected: (id, recipient, sender, content, created_at)
type RawRow = (String, String, String, String, i64);

const COLUMNS: &str = "id, recipient, sender, content, created_at";

/// A chat message as stored in SQLite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: String,
    pub recipient: String,
    pub sender: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl From<RawRow> for MessageRow {
    fn from((id, recipient, sender, content, created_at): RawRow) -> Self {
        Self {
            id,
            recipient,
            sender,
            content,
            created_at,
        }
    }
}

/// Repository for message operations.
pub struct MessageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MessageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a message row.
    pub async fn insert(&self, row: &MessageRow) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, recipient, sender, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.recipient)
        .bind(&row.sender)
        .bind(&row.content)
        .bind(row.created_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a single message by id.
    pub async fn find(&self, id: &str) -> Result<Option<MessageRow>, DbError> {
        let row = sqlx::query_as::<_, RawRow>(&format!(
            "SELECT {COLUMNS} FROM messages WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(MessageRow::from))
    }

    /// Every message, oldest first.
    pub async fn list_all(&self) -> Result<Vec<MessageRow>, DbError> {
        let rows = sqlx::query_as::<_, RawRow>(&format!(
            "SELECT {COLUMNS} FROM messages ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(MessageRow::from).collect())
    }

    /// The conversation between two users in either direction, oldest first.
    pub async fn between(&self, a: &str, b: &str) -> Result<Vec<MessageRow>, DbError> {
        let rows = sqlx::query_as::<_, RawRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM messages
            WHERE (sender = ? AND recipient = ?) OR (sender = ? AND recipient = ?)
            ORDER BY created_at ASC, rowid ASC
            "#
        ))
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(MessageRow::from).collect())
    }

    /// Delete one message. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete messages created before `cutoff_millis`.
    pub async fn prune_before(&self, cutoff_millis: i64) -> Result<usize, DbError> {
        let result = sqlx::query("DELETE FROM messages WHERE created_at < ?")
            .bind(cutoff_millis)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }
}
