//! Type definitions for persisted messages.

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;
use yapple_proto::UserId;

use super::StorageError;

/// A chat message as persisted after relay. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMessage {
    pub id: String,
    pub to: UserId,
    pub from: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl PersistedMessage {
    /// Stamp a new message with a v4 id and the current time.
    ///
    /// Time is truncated to milliseconds, the precision every backend keeps.
    pub fn new(to: &UserId, from: &UserId, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            to: to.clone(),
            from: from.clone(),
            content: content.to_string(),
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    pub fn created_at_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    /// Rebuild a message from stored columns.
    pub(super) fn from_parts(
        id: String,
        to: String,
        from: String,
        content: String,
        created_at_millis: i64,
    ) -> Result<Self, StorageError> {
        let to = UserId::new(to).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let from = UserId::new(from).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_at_millis).ok_or_else(
            || StorageError::Serialization(format!("timestamp out of range: {created_at_millis}")),
        )?;
        Ok(Self {
            id,
            to,
            from,
            content,
            created_at,
        })
    }

    /// Whether this message was exchanged between `a` and `b`, either way.
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }
}

/// Milliseconds-since-epoch cutoff for a retention window ending now.
pub(super) fn retention_cutoff(retention: std::time::Duration) -> i64 {
    let window = i64::try_from(retention.as_millis()).unwrap_or(i64::MAX);
    Utc::now().timestamp_millis().saturating_sub(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn new_messages_get_distinct_ids() {
        let a = PersistedMessage::new(&uid("u2"), &uid("u1"), "hey");
        let b = PersistedMessage::new(&uid("u2"), &uid("u1"), "hey");
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn from_parts_round_trips_millis() {
        let msg = PersistedMessage::new(&uid("u2"), &uid("u1"), "hey");
        let rebuilt = PersistedMessage::from_parts(
            msg.id.clone(),
            "u2".into(),
            "u1".into(),
            "hey".into(),
            msg.created_at_millis(),
        )
        .unwrap();
        assert_eq!(rebuilt, msg);
    }

    #[test]
    fn from_parts_rejects_empty_user() {
        let err = PersistedMessage::from_parts("m".into(), "".into(), "u1".into(), "x".into(), 0)
            .unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn is_between_ignores_direction() {
        let msg = PersistedMessage::new(&uid("u2"), &uid("u1"), "hey");
        assert!(msg.is_between(&uid("u1"), &uid("u2")));
        assert!(msg.is_between(&uid("u2"), &uid("u1")));
        assert!(!msg.is_between(&uid("u1"), &uid("u3")));
    }
}
