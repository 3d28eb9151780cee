//! Core state types.
//!
//! This module provides [`Config`], the tunable server settings, and
//! [`ServerState`], the running flag and advertised address that the host
//! process reads to display the connection URL.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::protocol_constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_PORT, DEFAULT_SHUTDOWN_GRACE_SECS, DEFAULT_STALL_TIMEOUT_SECS,
};

/// Configuration for the streaming server.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Port to listen on (0 = let the OS pick one).
    pub port: u16,

    /// Bytes read from a byte source per body chunk.
    pub chunk_size: usize,

    /// Seconds a stalled client may hold a byte source open.
    pub stall_timeout_secs: u64,

    /// Seconds in-flight responses get to finish when the server stops.
    pub shutdown_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            stall_timeout_secs: DEFAULT_STALL_TIMEOUT_SECS,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be >= 1".to_string());
        }
        if self.stall_timeout_secs == 0 {
            return Err(
                "stall_timeout_secs must be >= 1 (0 would close every stream immediately)"
                    .to_string(),
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stall_timeout_secs)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Running state of the server, shared with the host process.
///
/// Only [`MediaServer`](crate::lifecycle::MediaServer) writes to it, once on
/// start and once on stop. Everyone else holds an `Arc<ServerState>` and reads.
#[derive(Debug, Default)]
pub struct ServerState {
    running: AtomicBool,
    bound_address: RwLock<Option<String>>,
}

impl ServerState {
    /// Creates a stopped state with no address.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the server is accepting connections.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns the advertised base URL (e.g. `http://192.168.1.20:8080`).
    #[must_use]
    pub fn bound_address(&self) -> Option<String> {
        self.bound_address.read().clone()
    }

    pub(crate) fn mark_started(&self, address: String) {
        *self.bound_address.write() = Some(address);
        self.running.store(true, Ordering::SeqCst);
    }

    pub(crate) fn mark_stopped(&self) {
        self.running.store(false, Ordering::SeqCst);
        *self.bound_address.write() = None;
    }
}
