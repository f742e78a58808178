//! Distcraft Message Protocol (DMP) codec
//!
//! DMP is the text wire format spoken between distcraft nodes: one balanced
//! `message` root element stamped with a decimal `version` attribute,
//! containing `event` elements, each containing ordered `argument` elements.
//! This crate provides the incremental push-based parser and the matching
//! builder; it knows nothing about sockets or event dispatch.

pub mod builder;
pub mod error;
pub mod parser;
pub mod value;

pub use builder::MessageBuilder;
pub use error::ProtocolError;
pub use parser::{MessageParser, ParserState, WireEvent};
pub use value::Value;

/// Protocol version stamped onto outgoing messages.
pub const PROTOCOL_VERSION: f64 = 0.1;

/// Oldest peer protocol version the parser will accept.
pub const MIN_PROTOCOL_VERSION: f64 = 0.1;
