//! Per-response delivery tracking.

use std::net::SocketAddr;
use std::time::Instant;

/// Why a body pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Every byte of the window was handed to the HTTP layer.
    Completed,
    /// The client went away (body dropped).
    ClientGone,
    /// The client stopped reading for longer than the stall timeout.
    Stalled,
    /// Reading the source failed mid-stream.
    ReadError,
    /// The server is shutting down.
    Cancelled,
}

impl StreamEnd {
    fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::ClientGone => "client_gone",
            Self::Stalled => "stalled",
            Self::ReadError => "read_error",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Logs the lifecycle of one streamed response.
///
/// Owned by the pump task, so counters are plain integers. The summary line
/// is written on drop, which also covers a pump task that is aborted.
pub struct StreamGuard {
    resource_id: String,
    client: Option<SocketAddr>,
    window: String,
    expected_bytes: u64,
    started: Instant,
    bytes_sent: u64,
    chunks_sent: u64,
    end: Option<StreamEnd>,
}

impl StreamGuard {
    /// Creates a new guard that logs stream lifecycle events.
    pub fn new(
        resource_id: impl Into<String>,
        client: Option<SocketAddr>,
        window: String,
        expected_bytes: u64,
    ) -> Self {
        let resource_id = resource_id.into();
        log::debug!(
            "[Stream] Started: resource={}, client={}, window={}, bytes={}",
            resource_id,
            client_label(client),
            window,
            expected_bytes
        );
        Self {
            resource_id,
            client,
            window,
            expected_bytes,
            started: Instant::now(),
            bytes_sent: 0,
            chunks_sent: 0,
            end: None,
        }
    }

    /// Records a chunk accepted by the HTTP body.
    pub fn record_chunk(&mut self, len: usize) {
        self.bytes_sent += len as u64;
        self.chunks_sent += 1;
    }

    /// Records why the pump stopped. Only the first call counts.
    pub fn finish(&mut self, end: StreamEnd) {
        self.end.get_or_insert(end);
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let end = self.end.unwrap_or(StreamEnd::Cancelled);
        let elapsed_ms = self.started.elapsed().as_millis();
        let message = format!(
            "[Stream] Ended: resource={}, client={}, window={}, sent={}/{} bytes in {} chunk(s), duration={}ms, outcome={}",
            self.resource_id,
            client_label(self.client),
            self.window,
            self.bytes_sent,
            self.expected_bytes,
            self.chunks_sent,
            elapsed_ms,
            end.as_str()
        );
        match end {
            StreamEnd::Completed => log::info!("{}", message),
            StreamEnd::ClientGone | StreamEnd::Cancelled => log::debug!("{}", message),
            StreamEnd::Stalled | StreamEnd::ReadError => log::warn!("{}", message),
        }
    }
}

/// Client IP for log lines, `-` when unknown.
pub(crate) fn client_label(client: Option<SocketAddr>) -> String {
    client.map_or_else(|| "-".to_string(), |addr| addr.ip().to_string())
}
