//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use lanstream_core::protocol_constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_PORT, DEFAULT_SHUTDOWN_GRACE_SECS, DEFAULT_STALL_TIMEOUT_SECS,
};

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind the HTTP server to.
    /// Override: `LANSTREAM_PORT`
    pub port: u16,

    /// IP address to put in advertised URLs.
    /// If not specified, auto-detection will be attempted.
    /// Override: `LANSTREAM_ADVERTISE_IP`
    pub advertise_ip: Option<Ipv4Addr>,

    /// Directory scanned for songs and cover art.
    /// Override: `LANSTREAM_MEDIA_DIR`
    pub media_dir: Option<PathBuf>,

    /// Descend into subdirectories of `media_dir`.
    pub recursive: bool,

    /// Bytes per body chunk.
    pub chunk_size: usize,

    /// Seconds a client may stop reading before its stream is dropped.
    pub stall_timeout_secs: u64,

    /// Seconds in-flight responses get on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            advertise_ip: None,
            media_dir: None,
            recursive: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            stall_timeout_secs: DEFAULT_STALL_TIMEOUT_SECS,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides looked up by variable name. Unparseable values are
    /// ignored with a warning.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("LANSTREAM_PORT") {
            match val.parse() {
                Ok(port) => self.port = port,
                Err(_) => log::warn!("Ignoring invalid LANSTREAM_PORT: {}", val),
            }
        }

        if let Some(val) = lookup("LANSTREAM_ADVERTISE_IP") {
            match val.parse() {
                Ok(ip) => self.advertise_ip = Some(ip),
                Err(_) => log::warn!("Ignoring invalid LANSTREAM_ADVERTISE_IP: {}", val),
            }
        }

        if let Some(val) = lookup("LANSTREAM_MEDIA_DIR") {
            if !val.is_empty() {
                self.media_dir = Some(PathBuf::from(val));
            }
        }
    }

    /// Converts to lanstream-core's Config type.
    pub fn to_core_config(&self) -> lanstream_core::Config {
        lanstream_core::Config {
            port: self.port,
            chunk_size: self.chunk_size,
            stall_timeout_secs: self.stall_timeout_secs,
            shutdown_grace_secs: self.shutdown_grace_secs,
        }
    }
}
