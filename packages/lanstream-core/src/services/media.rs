//! Route pipelines for songs and cover art.
//!
//! Each route is a linear pipeline, `validate → lookup → open → (range)`,
//! that either yields a [`StreamPlan`] or stops at the first failing step with
//! a [`StreamError`]. No socket is involved, so the whole state machine is
//! testable in isolation. An opened source that does not make it into a plan
//! is dropped (closed) on the way out.

use std::sync::Arc;

use crate::error::{StreamError, StreamResult};
use crate::media::{FileAccess, MediaCatalog};
use crate::stream::{first_range, resolve_range, StreamPlan, Window};

/// Resolves song and art requests against the catalog and file access.
pub struct MediaService {
    catalog: Arc<dyn MediaCatalog>,
    files: Arc<dyn FileAccess>,
}

impl MediaService {
    pub fn new(catalog: Arc<dyn MediaCatalog>, files: Arc<dyn FileAccess>) -> Self {
        Self { catalog, files }
    }

    /// Pipeline for `GET /song/{id}`.
    ///
    /// - missing or blank id → `BadRequest`
    /// - unknown id → `NotFound` (nothing is opened)
    /// - source fails to open → `NotFound`
    /// - no `Range` → whole file
    /// - `Range` malformed or empty → `BadRequest`
    /// - `Range` outside the file → `RangeNotSatisfiable`
    ///
    /// Only the first range of a multi-range header is served.
    pub async fn song_plan(
        &self,
        id: Option<&str>,
        range_header: Option<&str>,
    ) -> StreamResult<StreamPlan> {
        let id = require_id(id, "song")?;

        let resource = self.catalog.lookup(id).await.ok_or_else(|| {
            log::debug!("[Media] Unknown song id: {}", id);
            StreamError::NotFound(format!("unknown song: {}", id))
        })?;

        let source = self.files.open(&resource.media).await.map_err(|e| {
            log::warn!("[Media] Failed to open song {}: {}", id, e);
            StreamError::from_song_source(e)
        })?;

        let window = match range_header {
            None => Window::Full,
            Some(value) => {
                let total = source.total_len();
                let range = first_range(value)
                    .and_then(|spec| resolve_range(spec, total))
                    .map_err(|e| {
                        log::debug!(
                            "[Media] Rejected range '{}' for {} ({} bytes): {}",
                            value,
                            id,
                            total,
                            e
                        );
                        StreamError::from_range(e, total)
                    })?;
                Window::Partial(range)
            }
        };

        Ok(StreamPlan {
            resource_id: resource.id,
            source,
            window,
            content_type: resource.content_type,
        })
    }

    /// Pipeline for `GET /art/{id}`.
    ///
    /// Art is always sent whole; range requests are not honoured here.
    /// - missing or blank id → `BadRequest`
    /// - unknown id or no art locator → `NotFound`
    /// - source fails to open → `Internal`
    pub async fn art_plan(&self, id: Option<&str>) -> StreamResult<StreamPlan> {
        let id = require_id(id, "art")?;

        let resource = self
            .catalog
            .lookup(id)
            .await
            .ok_or_else(|| StreamError::NotFound(format!("unknown song: {}", id)))?;

        let art = resource
            .art
            .as_ref()
            .ok_or_else(|| StreamError::NotFound(format!("no cover art for: {}", id)))?;

        let source = self.files.open(art).await.map_err(|e| {
            log::error!("[Media] Failed to open art for {}: {}", id, e);
            StreamError::from_art_source(e)
        })?;

        Ok(StreamPlan {
            resource_id: resource.id,
            source,
            window: Window::Full,
            content_type: resource.art_content_type,
        })
    }
}

fn require_id<'a>(id: Option<&'a str>, what: &str) -> StreamResult<&'a str> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(StreamError::BadRequest(format!("missing {} id", what))),
    }
}
