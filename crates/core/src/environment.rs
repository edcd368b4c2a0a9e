//! Host environment: working directory, environment variables and platform.

use crate::tools::Platform;
use std::env;
use std::path::{Path, PathBuf};

/// Name of the variable holding the executable search list.
pub const PATH_VARIABLE: &str = "PATH";

/// Read-only view of the process environment used by resolution.
pub trait HostEnvironment: Send + Sync {
    /// Directory relative paths are resolved against.
    fn working_directory(&self) -> PathBuf;

    /// Value of an environment variable, if set.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Platform the tools will run on.
    fn platform(&self) -> Platform;

    /// Whether the platform is Windows-family.
    fn is_windows(&self) -> bool {
        self.platform().is_windows()
    }

    /// Make `path` absolute against [`working_directory`](Self::working_directory).
    fn make_absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_directory().join(path)
        }
    }
}

/// [`HostEnvironment`] backed by the current process.
#[derive(Debug, Clone, Default)]
pub struct SystemEnvironment {
    working_dir: Option<PathBuf>,
}

impl SystemEnvironment {
    /// Environment rooted at the process's current directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment rooted at an explicit working directory.
    #[must_use]
    pub fn with_working_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }
}

impl HostEnvironment for SystemEnvironment {
    fn working_directory(&self) -> PathBuf {
        self.working_dir.clone().unwrap_or_else(|| {
            env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        })
    }

    fn env_var(&self, name: &str) -> Option<String> {
        let value = env::var_os(name)?;
        Some(value.into_string().unwrap_or_else(|raw| {
            // Keep the readable entries of a PATH with one bad directory.
            tracing::debug!(variable = name, "Environment variable is not valid Unicode");
            raw.to_string_lossy().into_owned()
        }))
    }

    fn platform(&self) -> Platform {
        Platform::current()
    }
}
