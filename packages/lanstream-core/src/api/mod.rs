//! HTTP API layer.
//!
//! This module contains thin handlers that delegate to services.
//! It provides the router construction used by the server lifecycle.

use std::sync::Arc;

use thiserror::Error;

use crate::services::MediaService;
use crate::state::ServerState;
use crate::stream::Streamer;

pub mod http;
pub mod stream;

pub use http::create_router;

/// Errors that can occur when starting the server.
///
/// Any of these aborts the start attempt; the server is never marked running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `start` was called while the server is already running.
    #[error("Server already running")]
    AlreadyRunning,

    /// No LAN-facing IPv4 address could be found.
    #[error("No LAN IPv4 address available (is the device connected to a network?)")]
    NoLanAddress,

    /// Failed to bind to a TCP port.
    #[error("Failed to bind to port: {0}")]
    Bind(#[from] std::io::Error),

    /// Configuration values are unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Shared application state for the API layer.
///
/// This is a thin wrapper that holds references to services.
/// All business logic lives in the services themselves.
#[derive(Clone)]
pub struct AppState {
    /// Song and art pipelines.
    pub media: Arc<MediaService>,
    /// Response builder and pump-task tracker.
    pub streamer: Streamer,
    /// Running flag and advertised address.
    pub server_state: Arc<ServerState>,
}

impl AppState {
    pub fn new(media: Arc<MediaService>, streamer: Streamer, server_state: Arc<ServerState>) -> Self {
        Self {
            media,
            streamer,
            server_state,
        }
    }
}
