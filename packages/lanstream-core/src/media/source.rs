//! Byte sources and the file-access abstraction.
//!
//! A [`ByteSource`] is an exclusively owned, seekable handle over one
//! resource's bytes. Closing is tied to `Drop`: whoever owns the box last
//! releases the underlying handle, exactly once, on every path.

use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use crate::media::catalog::ResourceLocator;

/// A readable, seekable handle over a resource plus its total length.
pub trait ByteSource: AsyncRead + AsyncSeek + Send + Unpin {
    /// Total length of the resource in bytes.
    fn total_len(&self) -> u64;
}

/// Owned, type-erased byte source as handed out by [`FileAccess`].
pub type BoxedSource = Box<dyn ByteSource>;

/// Errors that can occur when opening a byte source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Nothing exists at the locator.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The resource exists but could not be opened.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Trait for opening byte sources from resource locators.
///
/// Implementations may block on I/O; the server awaits them per request.
#[async_trait]
pub trait FileAccess: Send + Sync {
    /// Opens a fresh byte source for `locator`.
    async fn open(&self, locator: &ResourceLocator) -> Result<BoxedSource, SourceError>;
}

/// File access backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalFileAccess;

impl LocalFileAccess {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileAccess for LocalFileAccess {
    async fn open(&self, locator: &ResourceLocator) -> Result<BoxedSource, SourceError> {
        let path = locator.path();
        let file = File::open(path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
            _ => SourceError::Io(e),
        })?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(SourceError::NotFound(path.display().to_string()));
        }
        Ok(Box::new(FileSource {
            file,
            len: metadata.len(),
        }))
    }
}

/// A byte source over an open file.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    len: u64,
}

impl ByteSource for FileSource {
    fn total_len(&self) -> u64 {
        self.len
    }
}

impl AsyncRead for FileSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

impl AsyncSeek for FileSource {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.file).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.file).poll_complete(cx)
    }
}
