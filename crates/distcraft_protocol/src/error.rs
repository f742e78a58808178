//! Decode errors for the DMP wire format.

use thiserror::Error;

/// Errors raised while decoding an incoming message.
///
/// All of these are recoverable per connection: the peer is told about the
/// failure and the parser becomes usable again after a `reset()`. None of
/// them may terminate the dispatcher or affect other connections.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("client protocol too old: version {version}, minimum supported {minimum}")]
    VersionTooOld { version: f64, minimum: f64 },

    #[error("message version attribute missing or not numeric")]
    InvalidVersion,

    #[error("events must provide a name")]
    MissingEventName,

    #[error("nested events not supported")]
    NestedEvent,

    #[error("argument must be part of an event")]
    ArgumentOutsideEvent,

    #[error("argument declared as {declared} but value {text:?} does not parse")]
    InvalidArgument { declared: &'static str, text: String },

    #[error("unexpected element {0:?}")]
    UnexpectedElement(String),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("parser stopped after an error, reset required")]
    ResetRequired,
}
