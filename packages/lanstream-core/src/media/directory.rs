//! Catalog built by scanning a media directory.
//!
//! Song ids are file stems. Cover art is taken from a sibling image with the
//! same stem (`song.jpg` next to `song.mp3`), falling back to a folder-level
//! `cover.jpg` / `folder.jpg`.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::media::catalog::{MediaCatalog, MediaResource, ResourceLocator};

/// Folder-level art names, checked in order (case-insensitive).
const FOLDER_ART_NAMES: &[&str] = &["cover.jpg", "cover.jpeg", "cover.png", "folder.jpg", "folder.png"];

/// Image extensions accepted for per-song art, in preference order.
const ART_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Returns the audio MIME type for a file extension, or `None` if the file
/// is not a supported audio format.
#[must_use]
pub fn audio_mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "m4a" | "aac" => Some("audio/mp4"),
        "flac" => Some("audio/flac"),
        "ogg" | "oga" | "opus" => Some("audio/ogg"),
        "wav" => Some("audio/wav"),
        _ => None,
    }
}

/// Returns the image MIME type for a file extension.
#[must_use]
pub fn image_mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// Catalog of the audio files found under a directory.
pub struct DirectoryCatalog {
    root: PathBuf,
    recursive: bool,
    entries: RwLock<HashMap<String, MediaResource>>,
}

impl DirectoryCatalog {
    /// Scans `root` and builds the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be read.
    pub fn scan(root: impl Into<PathBuf>, recursive: bool) -> io::Result<Self> {
        let catalog = Self {
            root: root.into(),
            recursive,
            entries: RwLock::new(HashMap::new()),
        };
        catalog.rescan()?;
        Ok(catalog)
    }

    /// Rebuilds the catalog from disk, returning the number of songs found.
    pub fn rescan(&self) -> io::Result<usize> {
        let mut entries = HashMap::new();
        scan_dir(&self.root, self.recursive, &mut entries)?;
        let count = entries.len();
        *self.entries.write() = entries;
        log::info!(
            "[Catalog] Indexed {} song(s) under {}",
            count,
            self.root.display()
        );
        Ok(count)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns all song ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl MediaCatalog for DirectoryCatalog {
    async fn lookup(&self, id: &str) -> Option<MediaResource> {
        self.entries.read().get(id).cloned()
    }
}

fn scan_dir(
    dir: &Path,
    recursive: bool,
    entries: &mut HashMap<String, MediaResource>,
) -> io::Result<()> {
    let mut files = Vec::new();
    let mut subdirs = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            subdirs.push(entry.path());
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    subdirs.sort();

    let folder_art = find_folder_art(&files);

    for path in files.iter().filter(|p| audio_mime_for(p).is_some()) {
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            log::warn!("[Catalog] Skipping non UTF-8 file name: {}", path.display());
            continue;
        };
        if entries.contains_key(id) {
            log::warn!(
                "[Catalog] Duplicate song id '{}' at {}, keeping first",
                id,
                path.display()
            );
            continue;
        }

        let content_type = audio_mime_for(path).unwrap_or_default();
        let mut resource = MediaResource::new(id, ResourceLocator::new(path.clone()))
            .with_content_type(content_type);

        if let Some(art) = find_song_art(path, &files).or_else(|| folder_art.clone()) {
            if let Some(mime) = image_mime_for(&art) {
                resource = resource.with_art_content_type(mime);
            }
            resource = resource.with_art(ResourceLocator::new(art));
        }

        entries.insert(id.to_string(), resource);
    }

    if recursive {
        for subdir in subdirs {
            if let Err(e) = scan_dir(&subdir, recursive, entries) {
                log::warn!("[Catalog] Failed to scan {}: {}", subdir.display(), e);
            }
        }
    }
    Ok(())
}

fn find_song_art(song: &Path, files: &[PathBuf]) -> Option<PathBuf> {
    let stem = song.file_stem()?;
    ART_EXTENSIONS.iter().find_map(|ext| {
        files
            .iter()
            .find(|f| {
                f.file_stem() == Some(stem)
                    && f.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
            })
            .cloned()
    })
}

fn find_folder_art(files: &[PathBuf]) -> Option<PathBuf> {
    FOLDER_ART_NAMES.iter().find_map(|name| {
        files
            .iter()
            .find(|f| {
                f.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .cloned()
    })
}
