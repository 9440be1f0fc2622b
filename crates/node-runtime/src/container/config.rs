//! # Host Configuration
//!
//! Unified configuration for the region host: network binding, interregion
//! communications, hosted regions and the static neighbour directory.
//!
//! Loaded from an optional TOML file, then overridden from the environment:
//!
//! | Variable           | Field                              |
//! |--------------------|------------------------------------|
//! | `IR_GRID_SEND_KEY` | `communications.grid_send_key`     |
//! | `IR_HTTP_PORT`     | `network.http_port`                |
//! | `IR_BIND_HOST`     | `network.bind_host`                |
//!
//! ## Security Requirements
//!
//! - `grid_send_key` MUST be set when `interregion = "rest"`; every peer of
//!   the grid shares it.

use ir_06_dispatch::InterregionMode;
use serde::{Deserialize, Serialize};
use shared_types::{RegionEndpoint, RegionHandle, MAX_GRID_COORD};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const ENV_GRID_SEND_KEY: &str = "IR_GRID_SEND_KEY";
pub const ENV_HTTP_PORT: &str = "IR_HTTP_PORT";
pub const ENV_BIND_HOST: &str = "IR_BIND_HOST";

/// Complete host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Network configuration.
    pub network: NetworkConfig,
    /// Interregion communications.
    pub communications: CommunicationsConfig,
    /// Regions simulated by this host.
    pub regions: Vec<RegionConfig>,
    /// Remote regions known without a grid service.
    pub neighbours: Vec<NeighbourConfig>,
}

impl HostConfig {
    /// Read `path` (if any), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        info!(path = %path.display(), regions = config.regions.len(), "Loaded host configuration");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from `lookup`, normally the process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(key) = lookup(ENV_GRID_SEND_KEY) {
            self.communications.grid_send_key = key;
            info!("Loaded grid send key from environment");
        }
        if let Some(port) = lookup(ENV_HTTP_PORT) {
            self.network.http_port = port.parse().map_err(|_| ConfigError::InvalidOverride {
                variable: ENV_HTTP_PORT,
                value: port,
            })?;
        }
        if let Some(host) = lookup(ENV_BIND_HOST) {
            self.network.bind_host = host;
        }
        Ok(())
    }

    /// Reject configurations the host cannot run with.
    ///
    /// # Returns
    ///
    /// Returns `Err` if:
    /// - REST is enabled without a grid send key
    /// - nonce retention is zero
    /// - two hosted regions share a handle
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.communications.interregion == InterregionMode::Rest
            && self.communications.grid_send_key.is_empty()
        {
            return Err(ConfigError::MissingGridSendKey);
        }
        if self.communications.nonce_retention_secs == 0 {
            return Err(ConfigError::ZeroRetention);
        }

        let grids = self
            .regions
            .iter()
            .map(|r| (r.grid_x, r.grid_y))
            .chain(self.neighbours.iter().map(|n| (n.grid_x, n.grid_y)));
        for (grid_x, grid_y) in grids {
            if RegionHandle::try_from_grid(grid_x, grid_y).is_none() {
                return Err(ConfigError::GridOutOfRange { grid_x, grid_y });
            }
        }

        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region.handle()) {
                return Err(ConfigError::DuplicateRegion(region.handle()));
            }
        }
        for neighbour in &self.neighbours {
            if seen.contains(&neighbour.handle()) {
                warn!(
                    region_handle = %neighbour.handle(),
                    "Neighbour entry shadows a hosted region; the hosted region wins"
                );
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.network.bind_host, self.network.http_port);
        addr.parse().map_err(|_| ConfigError::InvalidBindAddress(addr))
    }

    pub fn nonce_retention(&self) -> Duration {
        Duration::from_secs(self.communications.nonce_retention_secs)
    }

    pub fn neighbour_endpoints(&self) -> Vec<RegionEndpoint> {
        self.neighbours.iter().map(NeighbourConfig::endpoint).collect()
    }
}

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Parse(String),

    #[error("{variable}={value} is not valid")]
    InvalidOverride { variable: &'static str, value: String },

    #[error("grid send key is empty; set {ENV_GRID_SEND_KEY} or communications.grid_send_key")]
    MissingGridSendKey,

    #[error("nonce retention must be at least one second")]
    ZeroRetention,

    #[error("grid coordinates ({grid_x}, {grid_y}) exceed {MAX_GRID_COORD}")]
    GridOutOfRange { grid_x: u32, grid_y: u32 },

    #[error("region handle {0} is hosted twice")]
    DuplicateRegion(RegionHandle),

    #[error("invalid bind address {0}")]
    InvalidBindAddress(String),
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Interface the peer HTTP surface listens on.
    pub bind_host: String,
    /// Port of the peer HTTP surface.
    pub http_port: u16,
    /// Name peers use to reach this host.
    pub external_host: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            http_port: 9000,
            external_host: "127.0.0.1".to_string(),
        }
    }
}

/// Interregion communications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationsConfig {
    pub interregion: InterregionMode,
    /// Grid-wide shared secret. Never logged.
    pub grid_send_key: String,
    /// How long a cancelled crossing's nonce suppresses a late create.
    pub nonce_retention_secs: u64,
}

impl Default for CommunicationsConfig {
    fn default() -> Self {
        Self {
            interregion: InterregionMode::Rest,
            grid_send_key: String::new(),
            nonce_retention_secs: ir_02_nonce_ledger::DEFAULT_RETENTION.as_secs(),
        }
    }
}

/// One hosted region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub region_id: Uuid,
    pub grid_x: u32,
    pub grid_y: u32,
}

impl RegionConfig {
    pub fn handle(&self) -> RegionHandle {
        RegionHandle::from_grid(self.grid_x, self.grid_y)
    }
}

/// Static directory entry for a region on another host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighbourConfig {
    pub region_id: Uuid,
    pub grid_x: u32,
    pub grid_y: u32,
    pub host: String,
    pub http_port: u16,
}

impl NeighbourConfig {
    pub fn handle(&self) -> RegionHandle {
        RegionHandle::from_grid(self.grid_x, self.grid_y)
    }

    pub fn endpoint(&self) -> RegionEndpoint {
        RegionEndpoint {
            region_id: self.region_id,
            handle: self.handle(),
            host: self.host.clone(),
            http_port: self.http_port,
        }
    }
}
