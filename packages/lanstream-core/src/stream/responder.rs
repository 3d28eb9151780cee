//! Turns an open byte source into a full (200) or partial (206) response.
//!
//! The body is produced by a pump task that owns the source and feeds fixed
//! size chunks through a bounded channel. Memory per response is capped at
//! `STREAM_CHANNEL_CHUNKS * chunk_size` regardless of the window size, and the
//! source is dropped (closed) as soon as the pump stops for any reason.

use std::io::{self, SeekFrom};
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::{StreamError, StreamResult};
use crate::media::BoxedSource;
use crate::protocol_constants::{ACCEPT_RANGES_BYTES, STREAM_CHANNEL_CHUNKS};
use crate::state::Config;
use crate::stream::guard::{StreamEnd, StreamGuard};
use crate::stream::range::ByteRange;

/// Which part of the source to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The whole resource, status 200.
    Full,
    /// An inclusive sub-range, status 206.
    Partial(ByteRange),
}

/// A validated request, ready to be streamed.
///
/// Produced by the route pipelines in [`MediaService`](crate::services::MediaService);
/// owns the open source until [`Streamer::respond`] hands it to a pump task.
pub struct StreamPlan {
    pub resource_id: String,
    pub source: BoxedSource,
    pub window: Window,
    pub content_type: String,
}

impl std::fmt::Debug for StreamPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPlan")
            .field("resource_id", &self.resource_id)
            .field("total_len", &self.source.total_len())
            .field("window", &self.window)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Builds streaming responses and tracks their pump tasks.
///
/// Cloned into every request. Cancelling the token passed to [`Streamer::new`]
/// stops every pump and closes every open source.
#[derive(Clone)]
pub struct Streamer {
    chunk_size: usize,
    stall_timeout: Duration,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Streamer {
    pub fn new(config: &Config, cancel: CancellationToken) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            stall_timeout: config.stall_timeout(),
            cancel,
            tracker: TaskTracker::new(),
        }
    }

    /// Tracker for the pump tasks, used by the lifecycle to drain on stop.
    #[must_use]
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Number of responses currently streaming.
    #[must_use]
    pub fn active_streams(&self) -> usize {
        self.tracker.len()
    }

    /// Writes the status line and headers for `plan` and starts streaming
    /// its body.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Internal`] if the source cannot be positioned or
    /// the response cannot be built. The source is released in both cases.
    pub async fn respond(
        &self,
        plan: StreamPlan,
        client: Option<SocketAddr>,
    ) -> StreamResult<Response> {
        let StreamPlan {
            resource_id,
            mut source,
            window,
            content_type,
        } = plan;
        let total = source.total_len();

        let (status, body_len, content_range, window_label) = match window {
            Window::Full => (StatusCode::OK, total, None, "full".to_string()),
            Window::Partial(range) => {
                source
                    .seek(SeekFrom::Start(range.start))
                    .await
                    .map_err(|e| {
                        log::error!(
                            "[Stream] Seek to {} failed for {}: {}",
                            range.start,
                            resource_id,
                            e
                        );
                        StreamError::Internal(format!("failed to read resource: {}", e))
                    })?;
                (
                    StatusCode::PARTIAL_CONTENT,
                    range.len(),
                    Some(range.content_range(total)),
                    format!("{}-{}", range.start, range.end),
                )
            }
        };

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CHUNKS);

        let mut builder = Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::ACCEPT_RANGES, ACCEPT_RANGES_BYTES)
            .header(header::CONTENT_LENGTH, body_len.to_string());
        if let Some(content_range) = content_range {
            builder = builder.header(header::CONTENT_RANGE, content_range);
        }
        let response = builder
            .body(Body::from_stream(ReceiverStream::new(rx)))
            .map_err(|e| StreamError::Internal(e.to_string()))?;

        let guard = StreamGuard::new(resource_id, client, window_label, body_len);
        self.tracker.spawn(pump(
            source.take(body_len),
            tx,
            guard,
            self.chunk_size,
            self.stall_timeout,
            self.cancel.clone(),
        ));

        Ok(response)
    }
}

/// Reads `reader` chunk by chunk into the body channel.
///
/// Returns when the window is exhausted, the client is gone or stalled, a
/// read fails, or the server cancels. The reader (and the source inside it)
/// is dropped before `tx`, so the body only ends after the source is closed.
async fn pump(
    reader: Take<BoxedSource>,
    tx: mpsc::Sender<io::Result<Bytes>>,
    mut guard: StreamGuard,
    chunk_size: usize,
    stall_timeout: Duration,
    cancel: CancellationToken,
) {
    let mut chunks = ReaderStream::with_capacity(reader, chunk_size);

    let end = loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break StreamEnd::Cancelled,
            next = chunks.next() => next,
        };

        // A read error is queued like a chunk; it ends the body with an
        // error so hyper aborts the connection.
        let (item, len) = match next {
            None => break StreamEnd::Completed,
            Some(Ok(chunk)) => {
                let len = chunk.len();
                (Ok(chunk), Some(len))
            }
            Some(Err(e)) => {
                log::warn!("[Stream] Read failed mid-stream: {}", e);
                (Err(e), None)
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break StreamEnd::Cancelled,
            sent = tokio::time::timeout(stall_timeout, tx.send(item)) => match (sent, len) {
                (Ok(Ok(())), Some(len)) => guard.record_chunk(len),
                (Ok(Ok(())), None) => break StreamEnd::ReadError,
                (Ok(Err(_)), _) => break StreamEnd::ClientGone,
                (Err(_), _) => break StreamEnd::Stalled,
            },
        }
    };

    guard.finish(end);
    drop(chunks);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{pattern, SourceCounter, TrackedSource};

    fn streamer(chunk_size: usize) -> (Streamer, CancellationToken) {
        let cancel = CancellationToken::new();
        let config = Config {
            chunk_size,
            ..Default::default()
        };
        (Streamer::new(&config, cancel.clone()), cancel)
    }

    fn plan(source: TrackedSource, window: Window) -> StreamPlan {
        StreamPlan {
            resource_id: "song".into(),
            source: Box::new(source),
            window,
            content_type: "audio/mpeg".into(),
        }
    }

    async fn body_bytes(response: Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn full_content_streams_whole_source() {
        let counter = SourceCounter::default();
        let data = pattern(10_000);
        let (streamer, _) = streamer(1024);

        let response = streamer
            .respond(plan(counter.source(data.clone()), Window::Full), None)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get(header::ACCEPT_RANGES).unwrap(), "bytes");
        assert_eq!(headers.get(header::CONTENT_LENGTH).unwrap(), "10000");
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "audio/mpeg");
        assert!(headers.get(header::CONTENT_RANGE).is_none());

        let body = body_bytes(response).await;
        assert_eq!(&body[..], &data[..]);
        assert!(counter.all_closed());
    }

    #[tokio::test]
    async fn partial_content_matches_source_slice() {
        let counter = SourceCounter::default();
        let data = pattern(100_000);
        let (streamer, _) = streamer(4096);
        let range = ByteRange {
            start: 1234,
            end: 56_789,
        };

        let response = streamer
            .respond(
                plan(counter.source(data.clone()), Window::Partial(range)),
                None,
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let headers = response.headers();
        assert_eq!(
            headers.get(header::CONTENT_RANGE).unwrap(),
            "bytes 1234-56789/100000"
        );
        assert_eq!(headers.get(header::ACCEPT_RANGES).unwrap(), "bytes");
        assert_eq!(headers.get(header::CONTENT_LENGTH).unwrap(), "55556");

        let body = body_bytes(response).await;
        assert_eq!(body.len() as u64, range.len());
        assert_eq!(&body[..], &data[1234..=56_789]);
        assert!(counter.all_closed());
    }

    #[tokio::test]
    async fn single_byte_window_at_end() {
        let counter = SourceCounter::default();
        let data = pattern(50);
        let (streamer, _) = streamer(16);
        let range = ByteRange { start: 49, end: 49 };

        let response = streamer
            .respond(plan(counter.source(data.clone()), Window::Partial(range)), None)
            .await
            .unwrap();
        let body = body_bytes(response).await;
        assert_eq!(&body[..], &data[49..]);
        assert!(counter.all_closed());
    }

    #[tokio::test]
    async fn seek_failure_is_internal_error_and_releases_source() {
        let counter = SourceCounter::default();
        let (streamer, _) = streamer(1024);
        let source = counter.source(pattern(100)).failing_seek();

        let err = streamer
            .respond(
                plan(source, Window::Partial(ByteRange { start: 10, end: 20 })),
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(counter.opened(), 1);
        assert!(counter.all_closed());
    }

    #[tokio::test]
    async fn read_error_reaches_client_behind_full_channel() {
        let counter = SourceCounter::default();
        let (streamer, _) = streamer(16);
        // Four 16-byte chunks fill the channel, then the fifth read fails.
        let source = counter.source(pattern(1_000)).failing_read_at(64);

        let response = streamer
            .respond(plan(source, Window::Full), None)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let result = axum::body::to_bytes(response.into_body(), usize::MAX).await;
        assert!(result.is_err(), "truncated body must end with an error");

        streamer.tracker().close();
        streamer.tracker().wait().await;
        assert!(counter.all_closed());
    }

    #[tokio::test]
    async fn dropped_body_releases_source() {
        let counter = SourceCounter::default();
        let (streamer, _) = streamer(64);

        let response = streamer
            .respond(plan(counter.source(pattern(1_000_000)), Window::Full), None)
            .await
            .unwrap();
        drop(response);

        streamer.tracker().close();
        streamer.tracker().wait().await;
        assert!(counter.all_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_client_is_cut_off() {
        let counter = SourceCounter::default();
        let (streamer, _) = streamer(64);

        // Response is held but never read.
        let _response = streamer
            .respond(plan(counter.source(pattern(1_000_000)), Window::Full), None)
            .await
            .unwrap();
        assert_eq!(counter.closed(), 0);

        tokio::time::sleep(Duration::from_secs(31)).await;
        streamer.tracker().close();
        streamer.tracker().wait().await;
        assert!(counter.all_closed());
    }

    #[tokio::test]
    async fn cancellation_releases_open_sources() {
        let counter = SourceCounter::default();
        let (streamer, cancel) = streamer(64);

        let _first = streamer
            .respond(plan(counter.source(pattern(1_000_000)), Window::Full), None)
            .await
            .unwrap();
        let _second = streamer
            .respond(plan(counter.source(pattern(1_000_000)), Window::Full), None)
            .await
            .unwrap();
        assert_eq!(streamer.active_streams(), 2);

        cancel.cancel();
        streamer.tracker().close();
        streamer.tracker().wait().await;
        assert_eq!(counter.opened(), 2);
        assert!(counter.all_closed());
    }
}
