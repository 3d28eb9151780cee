//! Media catalog abstraction.
//!
//! The catalog maps an opaque song id to the locators of its audio bytes and
//! optional cover art. The server never caches what it returns; every request
//! looks the id up again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::protocol_constants::{DEFAULT_ART_MIME, DEFAULT_AUDIO_MIME};

/// Where a resource's bytes live.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocator(PathBuf);

impl ResourceLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// A playable song as described by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResource {
    /// Opaque identifier used in `/song/{id}` and `/art/{id}`.
    pub id: String,
    /// Audio bytes.
    pub media: ResourceLocator,
    /// Cover art bytes, if the song has any.
    pub art: Option<ResourceLocator>,
    /// MIME type of the audio bytes.
    pub content_type: String,
    /// MIME type of the cover art.
    pub art_content_type: String,
}

impl MediaResource {
    /// Creates a resource with default content types and no art.
    pub fn new(id: impl Into<String>, media: ResourceLocator) -> Self {
        Self {
            id: id.into(),
            media,
            art: None,
            content_type: DEFAULT_AUDIO_MIME.to_string(),
            art_content_type: DEFAULT_ART_MIME.to_string(),
        }
    }

    #[must_use]
    pub fn with_art(mut self, art: ResourceLocator) -> Self {
        self.art = Some(art);
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn with_art_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.art_content_type = content_type.into();
        self
    }
}

/// Trait for resolving song ids to resources.
///
/// Lookups may be slow (database, disk); the server awaits them per request
/// without holding any shared lock.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Returns the first resource matching `id`, if any.
    async fn lookup(&self, id: &str) -> Option<MediaResource>;
}

/// In-memory catalog, for embedding hosts that manage their own library.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    entries: RwLock<HashMap<String, MediaResource>>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a resource, keyed by its id.
    pub fn insert(&self, resource: MediaResource) {
        self.entries.write().insert(resource.id.clone(), resource);
    }

    /// Removes a resource, returning it if it was present.
    pub fn remove(&self, id: &str) -> Option<MediaResource> {
        self.entries.write().remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl FromIterator<MediaResource> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = MediaResource>>(iter: I) -> Self {
        let catalog = Self::new();
        for resource in iter {
            catalog.insert(resource);
        }
        catalog
    }
}

#[async_trait]
impl MediaCatalog for StaticCatalog {
    async fn lookup(&self, id: &str) -> Option<MediaResource> {
        self.entries.read().get(id).cloned()
    }
}
