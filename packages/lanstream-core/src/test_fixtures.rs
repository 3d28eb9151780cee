//! Shared test fixtures: in-memory byte sources that count opens and closes.
//!
//! Used by multiple test modules to check that every opened source is
//! released exactly once.

use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, SeekFrom};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use crate::media::{BoxedSource, ByteSource, FileAccess, ResourceLocator, SourceError};

/// Deterministic test content.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Counts how many sources were opened and closed.
#[derive(Clone, Default)]
pub struct SourceCounter {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl SourceCounter {
    /// Opens a tracked in-memory source over `data`.
    pub fn source(&self, data: Vec<u8>) -> TrackedSource {
        self.opened.fetch_add(1, Ordering::SeqCst);
        TrackedSource {
            inner: Cursor::new(data),
            counter: self.clone(),
            fail_seek: false,
            fail_read_at: None,
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// True when every opened source has been closed exactly once.
    pub fn all_closed(&self) -> bool {
        self.opened() == self.closed()
    }
}

/// In-memory source that reports its release to a [`SourceCounter`].
pub struct TrackedSource {
    inner: Cursor<Vec<u8>>,
    counter: SourceCounter,
    fail_seek: bool,
    fail_read_at: Option<u64>,
}

impl TrackedSource {
    /// Makes every seek fail with an I/O error.
    pub fn failing_seek(mut self) -> Self {
        self.fail_seek = true;
        self
    }

    /// Makes reads fail once `offset` bytes have been read.
    pub fn failing_read_at(mut self, offset: u64) -> Self {
        self.fail_read_at = Some(offset);
        self
    }
}

impl Drop for TrackedSource {
    fn drop(&mut self) {
        self.counter.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl ByteSource for TrackedSource {
    fn total_len(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }
}

impl AsyncRead for TrackedSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self
            .fail_read_at
            .is_some_and(|offset| self.inner.position() >= offset)
        {
            return Poll::Ready(Err(io::Error::other("read failed")));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncSeek for TrackedSource {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        if self.fail_seek {
            return Err(io::Error::other("seek failed"));
        }
        Pin::new(&mut self.inner).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.inner).poll_complete(cx)
    }
}

/// File access over in-memory files, with optional failure injection.
#[derive(Default)]
pub struct FakeFileAccess {
    pub counter: SourceCounter,
    files: HashMap<PathBuf, Vec<u8>>,
    broken: HashSet<PathBuf>,
    fail_seek: bool,
}

impl FakeFileAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, data: Vec<u8>) -> Self {
        self.files.insert(path.into(), data);
        self
    }

    /// Opening `path` fails with a non-NotFound I/O error.
    pub fn with_broken(mut self, path: impl Into<PathBuf>) -> Self {
        self.broken.insert(path.into());
        self
    }

    /// Every source handed out fails to seek.
    pub fn with_failing_seek(mut self) -> Self {
        self.fail_seek = true;
        self
    }
}

#[async_trait]
impl FileAccess for FakeFileAccess {
    async fn open(&self, locator: &ResourceLocator) -> Result<BoxedSource, SourceError> {
        let path = locator.path();
        if self.broken.contains(path) {
            return Err(SourceError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            )));
        }
        let data = self
            .files
            .get(path)
            .ok_or_else(|| SourceError::NotFound(path.display().to_string()))?;
        let source = self.counter.source(data.clone());
        Ok(if self.fail_seek {
            Box::new(source.failing_seek())
        } else {
            Box::new(source)
        })
    }
}
