//! # yapple-proto
//!
//! Wire frames exchanged between Yapple clients and the real-time relay.
//!
//! Every frame is a single JSON object carried in one WebSocket text message.
//! The `type` field selects one of five variants:
//!
//! ```text
//! {"type":"connect","clientId":"<userId>"}
//! {"type":"text","from":"<userId>","to":"<userId>","content":"<string>"}
//! {"type":"message","from":"<userId>","content":"<string>"}
//! {"type":"ack","for":"<string>"}
//! {"type":"error","reason":"<string>"}
//! ```
//!
//! All string fields are required and must be non-empty.
//!
//! ## Quick Start
//!
//! ```rust
//! use yapple_proto::Frame;
//!
//! let frame = Frame::decode(r#"{"type":"connect","clientId":"u1"}"#).expect("valid frame");
//! assert_eq!(frame.kind_name(), "connect");
//!
//! let out = Frame::message("u1", "hey").expect("non-empty fields");
//! assert_eq!(out.encode(), r#"{"type":"message","from":"u1","content":"hey"}"#);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod frame;
pub mod user;

pub use self::error::{ErrorKind, ValidationError};
pub use self::frame::Frame;
pub use self::user::UserId;
