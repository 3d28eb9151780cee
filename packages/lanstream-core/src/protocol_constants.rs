//! Fixed protocol constants and tunable defaults.
//!
//! Values in the first sections are defined by HTTP (RFC 7233) or by what LAN
//! clients expect; the defaults at the bottom seed [`Config`](crate::state::Config).

// ─────────────────────────────────────────────────────────────────────────────
// Service Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Service identifier reported by the health endpoint.
pub const SERVICE_ID: &str = "lanstream";

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Range Requests (RFC 7233)
// ─────────────────────────────────────────────────────────────────────────────

/// The only range unit this server understands.
pub const RANGE_UNIT: &str = "bytes";

/// Value advertised in the `Accept-Ranges` header.
pub const ACCEPT_RANGES_BYTES: &str = "bytes";

// ─────────────────────────────────────────────────────────────────────────────
// Content Types
// ─────────────────────────────────────────────────────────────────────────────

/// Default MIME type for song bodies when the catalog gives none.
pub const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Default MIME type for cover art.
pub const DEFAULT_ART_MIME: &str = "image/jpeg";

// ─────────────────────────────────────────────────────────────────────────────
// Server Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Port clients expect the server on.
pub const DEFAULT_PORT: u16 = 8080;

/// Bytes read from a source per body chunk (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the pump task and the HTTP body.
///
/// Bounds per-response memory to `STREAM_CHANNEL_CHUNKS * chunk_size`.
pub const STREAM_CHANNEL_CHUNKS: usize = 4;

/// Seconds a client may leave a chunk undelivered before its source is closed.
pub const DEFAULT_STALL_TIMEOUT_SECS: u64 = 30;

/// Seconds in-flight responses get to finish after stop is requested.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Milliseconds to wait for the serve task after streams are cancelled.
pub const SERVE_TASK_JOIN_MS: u64 = 500;
