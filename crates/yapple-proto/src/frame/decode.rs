//! Two-stage decoding: JSON syntax first, then per-variant field checks.

use serde_json::{Map, Value};

use super::Frame;
use crate::error::{ErrorKind, ValidationError};
use crate::user::UserId;

pub(super) fn decode(raw: &str) -> Result<Frame, ValidationError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ValidationError::root(ErrorKind::Syntax(e.to_string())))?;

    let Value::Object(fields) = value else {
        return Err(ValidationError::root(ErrorKind::NotAnObject));
    };
    let fields = Fields(&fields);

    match fields.string("type")? {
        "connect" => Ok(Frame::Connect {
            client_id: fields.user_id("clientId")?,
        }),
        "text" => Ok(Frame::Text {
            from: fields.user_id("from")?,
            to: fields.user_id("to")?,
            content: fields.owned("content")?,
        }),
        "message" => Ok(Frame::Message {
            from: fields.user_id("from")?,
            content: fields.owned("content")?,
        }),
        "ack" => Ok(Frame::Ack {
            for_id: fields.owned("for")?,
        }),
        "error" => Ok(Frame::Error {
            reason: fields.owned("reason")?,
        }),
        other => Err(ValidationError::new(
            "type",
            ErrorKind::UnknownType(other.to_string()),
        )),
    }
}

/// Accessor enforcing "present, a string, non-empty" on every read.
struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
    fn string(&self, name: &str) -> Result<&'a str, ValidationError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Err(ValidationError::new(name, ErrorKind::MissingField)),
            Some(Value::String(s)) if s.is_empty() => {
                Err(ValidationError::new(name, ErrorKind::EmptyField))
            }
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(ValidationError::new(name, ErrorKind::WrongType)),
        }
    }

    fn owned(&self, name: &str) -> Result<String, ValidationError> {
        self.string(name).map(str::to_string)
    }

    fn user_id(&self, name: &str) -> Result<UserId, ValidationError> {
        let raw = self.string(name)?;
        UserId::new(raw).map_err(|_| ValidationError::new(name, ErrorKind::EmptyField))
    }
}
