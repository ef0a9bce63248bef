//! Error types for frame decoding.

use std::fmt;
use thiserror::Error;

/// Convenience type alias for Results using [`ValidationError`].
pub type Result<T, E = ValidationError> = std::result::Result<T, E>;

/// Path used for errors that concern the whole frame rather than one field.
pub const ROOT_PATH: &str = "$";

/// What went wrong while decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The text is not valid JSON.
    Syntax(String),
    /// The JSON value is not an object.
    NotAnObject,
    /// A required field is absent.
    MissingField,
    /// A field is present but is not a JSON string.
    WrongType,
    /// A string field is present but empty.
    EmptyField,
    /// The `type` discriminator names no known variant.
    UnknownType(String),
    /// The transport message carried bytes rather than text.
    NotText,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(cause) => write!(f, "malformed JSON: {cause}"),
            Self::NotAnObject => f.write_str("frame must be a JSON object"),
            Self::MissingField => f.write_str("field is required"),
            Self::WrongType => f.write_str("field must be a string"),
            Self::EmptyField => f.write_str("field must not be empty"),
            Self::UnknownType(name) => write!(f, "unknown frame type {name:?}"),
            Self::NotText => f.write_str("frames must be sent as text"),
        }
    }
}

/// A frame failed to decode.
///
/// Carries the path of the offending field (`$` for the frame itself) and a
/// human-readable message through its `Display` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    /// Field path, e.g. `to` or `clientId`.
    pub path: String,
    /// Failure category.
    pub kind: ErrorKind,
}

impl ValidationError {
    /// Build an error for a specific field.
    pub fn new(path: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Build an error concerning the whole frame.
    pub fn root(kind: ErrorKind) -> Self {
        Self::new(ROOT_PATH, kind)
    }

    /// Static label for metrics.
    pub fn code(&self) -> &'static str {
        match self.kind {
            ErrorKind::Syntax(_) => "syntax",
            ErrorKind::NotAnObject => "not_an_object",
            ErrorKind::MissingField => "missing_field",
            ErrorKind::WrongType => "wrong_type",
            ErrorKind::EmptyField => "empty_field",
            ErrorKind::UnknownType(_) => "unknown_type",
            ErrorKind::NotText => "binary",
        }
    }
}
