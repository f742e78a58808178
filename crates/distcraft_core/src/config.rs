//! Server configuration.

use distcraft_protocol::MIN_PROTOCOL_VERSION;

use crate::error::ServerError;

/// Compiled-in default listening port.
pub const DEFAULT_PORT: u16 = 7677;

/// Configuration for one [`DistCore`](crate::DistCore) instance.
///
/// The server always binds the loopback interface; only the port is
/// configurable.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on (loopback only).
    pub port: u16,

    /// Maximum number of concurrent peer connections.
    pub max_connections: usize,

    /// Oldest peer protocol version this node will decode.
    pub min_protocol_version: f64,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.max_connections == 0 {
            return Err(ServerError::Config(
                "max_connections must be greater than 0".into(),
            ));
        }
        if !self.min_protocol_version.is_finite() || self.min_protocol_version < 0.0 {
            return Err(ServerError::Config(
                "min_protocol_version must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_connections: 64,
            min_protocol_version: MIN_PROTOCOL_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_connections_is_invalid() {
        let config = ServerConfig::default().with_max_connections(0);
        assert!(config.validate().is_err());
    }
}
