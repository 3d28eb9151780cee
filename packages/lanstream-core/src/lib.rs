//! Lanstream Core - LAN media server library.
//!
//! This crate serves songs and cover art from a media catalog to devices on
//! the local network over plain HTTP. Songs support single byte-range
//! requests so players can seek; art is always sent whole.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`lifecycle`]: Start/stop of the listener and graceful shutdown
//! - [`api`]: Route table and thin HTTP handlers
//! - [`services`]: Song and art request pipelines
//! - [`stream`]: Range parsing and chunked response bodies
//! - [`media`]: Catalog and file-access collaborators
//! - [`context`]: LAN address detection and URL building
//! - [`state`]: Configuration and observable server state
//! - [`error`]: Per-request error taxonomy
//!
//! # Abstraction Traits
//!
//! The server depends only on these traits, so hosts can plug in their own
//! library, storage and network detection:
//!
//! - [`MediaCatalog`](media::MediaCatalog): Id to resource lookup
//! - [`FileAccess`](media::FileAccess): Opening seekable byte sources
//! - [`IpDetector`](context::IpDetector): Local IP detection
//!
//! Each trait has a default implementation used by the standalone server.

#![warn(clippy::all)]

pub mod api;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod media;
pub mod protocol_constants;
pub mod services;
pub mod state;
pub mod stream;

#[cfg(test)]
mod test_fixtures;

// Re-export commonly used types at the crate root
pub use api::ServerError;
pub use context::{IpDetector, LocalIpDetector, StaticIpDetector, UrlBuilder};
pub use error::{StreamError, StreamResult};
pub use lifecycle::MediaServer;
pub use media::{
    ByteSource, DirectoryCatalog, FileAccess, LocalFileAccess, MediaCatalog, MediaResource,
    ResourceLocator, SourceError, StaticCatalog,
};
pub use state::{Config, ServerState};
pub use stream::{ByteRange, RangeError, RangeSpec};
