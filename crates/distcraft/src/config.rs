//! Application configuration loaded from a TOML file.

use std::path::Path;

use anyhow::Context;
use distcraft_core::{ServerConfig, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cli::Args;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listening port; the server binds loopback only.
    pub port: u16,
    /// Maximum concurrent peer connections.
    pub max_connections: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                port: DEFAULT_PORT,
                max_connections: 64,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration, writing a default file when none exists.
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let config: AppConfig =
                toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, content)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!("created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Apply command-line overrides on top of the file values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(port) = args.port {
            self.server.port = port;
        }
    }

    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig::new(self.server.port).with_max_connections(self.server.max_connections)
    }
}
