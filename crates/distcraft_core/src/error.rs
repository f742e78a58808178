//! Server-side error types.

use std::net::SocketAddr;
use thiserror::Error;

/// Event registry failures surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no event handler registered for {0:?}")]
    HandlerNotFound(String),
}

/// Failures at the server/network boundary.
///
/// Only [`ServerError::Bind`] at startup is fatal. Transport errors on a
/// live connection never appear here; they become `client.disconnect`
/// events instead.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
