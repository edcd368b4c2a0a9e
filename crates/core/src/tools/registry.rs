//! Registry of explicitly pinned tool locations.
//!
//! Entries are indexed by file name (`nunit3-console.exe`) and only ever
//! added; registering the same file name again replaces the earlier path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use super::Platform;
use crate::{Error, Result};

/// How registered file names are compared with looked-up names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameComparison {
    /// Exact byte comparison (Unix file systems).
    #[default]
    CaseSensitive,
    /// ASCII case folding (Windows file systems).
    CaseInsensitive,
}

impl NameComparison {
    /// The native comparison of `platform`'s file systems.
    #[must_use]
    pub fn for_platform(platform: &Platform) -> Self {
        if platform.is_windows() {
            Self::CaseInsensitive
        } else {
            Self::CaseSensitive
        }
    }

    fn key(self, name: &str) -> String {
        match self {
            Self::CaseSensitive => name.to_string(),
            Self::CaseInsensitive => name.to_ascii_lowercase(),
        }
    }
}

/// Registry of tool paths known ahead of any file-system search.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    comparison: NameComparison,
    /// Paths indexed by their (normalized) file name.
    entries: RwLock<HashMap<String, PathBuf>>,
}

impl ToolRegistry {
    /// Create an empty registry with the given name comparison.
    #[must_use]
    pub fn new(comparison: NameComparison) -> Self {
        Self {
            comparison,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty registry comparing names the way `platform` does.
    #[must_use]
    pub fn for_platform(platform: &Platform) -> Self {
        Self::new(NameComparison::for_platform(platform))
    }

    /// The name comparison in effect.
    #[must_use]
    pub fn comparison(&self) -> NameComparison {
        self.comparison
    }

    /// Register a tool path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty or does not end
    /// in a file name.
    pub fn register(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument("path", "Path cannot be empty."));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::invalid_argument("path", "Path must name a file."))?;

        let key = self.comparison.key(&name);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = entries.insert(key, path.to_path_buf()) {
            tracing::debug!(
                tool = %name,
                previous = %previous.display(),
                path = %path.display(),
                "Replacing registered tool path"
            );
        } else {
            tracing::debug!(tool = %name, path = %path.display(), "Registered tool path");
        }
        Ok(())
    }

    /// Path registered under file name `name`, if any.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<PathBuf> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&self.comparison.key(name)).cloned()
    }

    /// All registered paths, in no particular order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().cloned().collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
