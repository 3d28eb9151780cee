//! Collaborators the server consumes: the catalog and the file-access layer.
//!
//! Both are traits so hosts can plug in their own library and storage. The
//! crate ships filesystem-backed implementations used by the standalone server.

pub mod catalog;
pub mod directory;
pub mod source;

pub use catalog::{MediaCatalog, MediaResource, ResourceLocator, StaticCatalog};
pub use directory::DirectoryCatalog;
pub use source::{BoxedSource, ByteSource, FileAccess, FileSource, LocalFileAccess, SourceError};
