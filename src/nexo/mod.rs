//! Protocol message layer
//!
//! Seals complete SaleToPOI request/response messages. Field-level schema
//! parsing is left to callers; this layer only needs the root key and the
//! `MessageHeader`, which stays readable for routing.

pub mod header;
pub mod protector;

pub use header::{MessageHeader, MessageKind};
pub use protector::MessageProtector;
