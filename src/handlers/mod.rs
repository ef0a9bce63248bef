//! Delivery of messages and notifications to users' live connections.
//!
//! - [`fanout`]: the single push path, shared by relayed chat and
//!   in-process notifications
//! - [`notify`]: activity notifications raised by application code

pub mod fanout;
pub mod notify;

pub use fanout::{DeliveryKind, DeliveryReport, Fanout};
pub use notify::{ActivityKind, VoteDirection};
