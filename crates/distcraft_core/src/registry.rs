//! Event handler registry.
//!
//! One mutex guards the whole registry, and `fire` runs the matched handler
//! while still holding it. That is a deliberate serialization guarantee:
//! all core-level event processing is strictly ordered and mutually
//! exclusive, at the cost of a slow handler blocking other dispatch.
//! Handlers must not call back into `register`/`unregister`/`fire`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use distcraft_protocol::Value;
use tracing::error;

use crate::connection::ConnectionHandle;
use crate::error::RegistryError;

/// Where a fired event came from.
#[derive(Debug, Clone)]
pub enum EventSource {
    /// Raised by the core itself (accept loop, disconnect handling).
    Server,
    /// Decoded from a peer message; the handle can be used to reply.
    Peer(ConnectionHandle),
}

impl EventSource {
    /// The peer connection behind this event, if any.
    pub fn connection(&self) -> Option<&ConnectionHandle> {
        match self {
            EventSource::Server => None,
            EventSource::Peer(handle) => Some(handle),
        }
    }
}

/// A registered event callback: `(source, ordered typed args)`.
pub type EventHandler = Arc<dyn Fn(&EventSource, &[Value]) + Send + Sync>;

/// Mapping from event name to exactly one handler.
///
/// Owned per dispatcher instance; registration is last-write-wins.
#[derive(Default)]
pub struct EventRegistry {
    handlers: Mutex<HashMap<String, EventHandler>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the handler for `name`.
    pub fn register<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&EventSource, &[Value]) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.lock().unwrap();
        handlers.insert(name.into(), Arc::new(handler));
    }

    /// Remove the handler for `name`.
    pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
        let mut handlers = self.handlers.lock().unwrap();
        handlers
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RegistryError::HandlerNotFound(name.to_string()))
    }

    /// Invoke the handler for `name` synchronously under the registry lock.
    ///
    /// An unroutable event is logged and dropped; it is never an error.
    pub fn fire(&self, name: &str, source: &EventSource, args: &[Value]) {
        let handlers = self.handlers.lock().unwrap();
        match handlers.get(name) {
            Some(handler) => handler(source, args),
            None => error!(event = name, "no event handler registered"),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
