//! Distcraft server core
//!
//! The core accepts peer connections, speaks DMP with them, and routes every
//! decoded event through a name-to-handler registry. Everything
//! application-specific (physics, rendering, game rules) lives outside the
//! core and reacts to events; the core only moves them.

pub mod config;
pub mod connection;
pub mod core;
pub mod error;
pub mod registry;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use connection::{ConnectionHandle, ConnectionId, ConnectionState};
pub use core::DistCore;
pub use error::{RegistryError, ServerError};
pub use registry::{EventHandler, EventRegistry, EventSource};
