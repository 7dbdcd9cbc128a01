//! CLI configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/waltz/transfer.toml`
//! - Windows: `%APPDATA%/waltz/transfer.toml`

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use waltz_protocol::constants::DEFAULT_ENDPOINT;
use waltz_transfer::SessionConfig;

/// Transfer CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// WebSocket endpoint of the transfer server.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Send the selection inside the start command.
    #[serde(default)]
    pub embed_selection: bool,

    /// Where to `POST` the selection before connecting.
    #[serde(default)]
    pub announce_url: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            embed_selection: false,
            announce_url: None,
        }
    }
}

impl CliConfig {
    /// Loads configuration from `path`, or from the platform default
    /// location. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path(),
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: CliConfig = toml::from_str(&content)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Session settings for the controller.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            endpoint: self.endpoint.clone(),
            embed_selection: self.embed_selection,
            announce_url: self.announce_url.clone(),
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("waltz").join("transfer.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("waltz")
            .join("transfer.toml")
    }
}
