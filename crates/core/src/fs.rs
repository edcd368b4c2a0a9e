//! File-system access used by tool resolution.

use std::io;
use std::path::Path;

/// Existence checks performed while resolving tools.
///
/// Errors other than "not found" are returned rather than swallowed so that
/// callers can decide whether a failing location is fatal.
pub trait FileSystem: Send + Sync {
    /// Whether a regular file exists at `path`.
    fn exists(&self, path: &Path) -> io::Result<bool>;
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create a new local file system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
