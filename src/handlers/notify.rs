//! Activity notifications pushed to content authors.
//!
//! Application code (vote and comment handlers) calls these in-process after
//! it has recorded the activity. Notifications are transient `text` frames
//! and are never persisted.

use super::fanout::{DeliveryKind, DeliveryReport, Fanout};
use tracing::debug;
use yapple_proto::UserId;

/// Activity that can notify an author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    NewPost,
    NewComment,
    LikePost,
    LikeComment,
    ReplyComment,
    NewVote,
}

impl ActivityKind {
    /// Stable snake_case name, as stored with notification records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewPost => "new_post",
            Self::NewComment => "new_comment",
            Self::LikePost => "like_post",
            Self::LikeComment => "like_comment",
            Self::ReplyComment => "reply_comment",
            Self::NewVote => "new_vote",
        }
    }

    /// Human-readable text pushed to the author.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NewPost => "someone has posted",
            Self::NewComment => "someone has commented",
            Self::LikePost => "someone liked your post",
            Self::LikeComment => "someone liked your comment",
            Self::ReplyComment => "someone replied to your comment",
            Self::NewVote => "someone has upvoted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl Fanout {
    /// Tell `author` that `actor` did `kind` on their content.
    ///
    /// Returns `None` when nothing is sent because the actor is the author.
    pub async fn notify_activity(
        &self,
        actor: &UserId,
        author: &UserId,
        kind: ActivityKind,
    ) -> Option<DeliveryReport> {
        if actor == author {
            debug!(user = %actor, kind = kind.as_str(), "Skipping self-notification");
            return None;
        }
        Some(
            self.deliver(actor, author, kind.message(), DeliveryKind::Text)
                .await,
        )
    }

    /// Notify `author` of a vote. Downvotes are silent.
    pub async fn notify_vote(
        &self,
        voter: &UserId,
        author: &UserId,
        direction: VoteDirection,
    ) -> Option<DeliveryReport> {
        match direction {
            VoteDirection::Up => {
                self.notify_activity(voter, author, ActivityKind::NewVote)
                    .await
            }
            VoteDirection::Down => None,
        }
    }
}
