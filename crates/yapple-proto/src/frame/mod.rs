//! The closed set of frames exchanged over a relay socket.

mod decode;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorKind, ValidationError};
use crate::user::UserId;

/// One JSON message on the socket.
///
/// Serialization is internally tagged by `type`, with fields emitted in
/// declaration order, so encoding is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    /// Registers the sending connection under `client_id`.
    Connect {
        /// The announcing user.
        #[serde(rename = "clientId")]
        client_id: UserId,
    },
    /// A direct chat message (client to server), or an in-app notification
    /// (server to client).
    Text {
        /// Sender.
        from: UserId,
        /// Recipient.
        to: UserId,
        /// Message body.
        content: String,
    },
    /// A relayed chat message as seen by its recipient. Server to client only.
    Message {
        /// Original sender.
        from: UserId,
        /// Message body.
        content: String,
    },
    /// Acknowledgement. Reserved.
    Ack {
        /// What is being acknowledged.
        #[serde(rename = "for")]
        for_id: String,
    },
    /// Error report.
    Error {
        /// Human-readable reason.
        reason: String,
    },
}

impl Frame {
    /// Decode a frame from wire text, validating every required field.
    pub fn decode(raw: &str) -> Result<Self, ValidationError> {
        decode::decode(raw)
    }

    /// Encode the frame as wire text.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// The wire discriminator of this frame.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Text { .. } => "text",
            Self::Message { .. } => "message",
            Self::Ack { .. } => "ack",
            Self::Error { .. } => "error",
        }
    }

    /// Build a `connect` frame.
    pub fn connect(client_id: &str) -> Result<Self, ValidationError> {
        Ok(Self::Connect {
            client_id: field_id("clientId", client_id)?,
        })
    }

    /// Build a `text` frame.
    pub fn text(from: &str, to: &str, content: &str) -> Result<Self, ValidationError> {
        Ok(Self::Text {
            from: field_id("from", from)?,
            to: field_id("to", to)?,
            content: field_str("content", content)?,
        })
    }

    /// Build a `message` frame.
    pub fn message(from: &str, content: &str) -> Result<Self, ValidationError> {
        Ok(Self::Message {
            from: field_id("from", from)?,
            content: field_str("content", content)?,
        })
    }

    /// Build an `ack` frame.
    pub fn ack(for_id: &str) -> Result<Self, ValidationError> {
        Ok(Self::Ack {
            for_id: field_str("for", for_id)?,
        })
    }

    /// Build an `error` frame.
    pub fn error(reason: &str) -> Result<Self, ValidationError> {
        Ok(Self::Error {
            reason: field_str("reason", reason)?,
        })
    }
}

fn field_str(path: &str, value: &str) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(path, ErrorKind::EmptyField));
    }
    Ok(value.to_string())
}

fn field_id(path: &str, value: &str) -> Result<UserId, ValidationError> {
    UserId::new(value).map_err(|_| ValidationError::new(path, ErrorKind::EmptyField))
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl FromStr for Frame {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
