//! In-memory collaborators for tests.
//!
//! Available under `cfg(test)` and the `testing` feature so dependent crates
//! can drive the resolution and invocation code without touching the host.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::environment::HostEnvironment;
use crate::fs::FileSystem;
use crate::process::{ProcessRunner, ProcessSettings, ToolProcess};
use crate::tools::{Os, Platform};

/// File system holding a fixed set of files.
#[derive(Debug, Default)]
pub struct FakeFileSystem {
    files: Mutex<HashSet<PathBuf>>,
    failing: Mutex<Vec<PathBuf>>,
}

impl FakeFileSystem {
    /// Create an empty file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `path` exist.
    pub fn add_file(&self, path: impl Into<PathBuf>) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
    }

    /// Make every existence check below `dir` fail with `PermissionDenied`.
    pub fn fail_directory(&self, dir: impl Into<PathBuf>) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(dir.into());
    }
}

impl FileSystem for FakeFileSystem {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        if failing.iter().any(|dir| path.starts_with(dir)) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("access denied: {}", path.display()),
            ));
        }
        Ok(self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path))
    }
}

/// Environment with a fixed working directory, platform and variables.
#[derive(Debug)]
pub struct FakeEnvironment {
    working_directory: PathBuf,
    platform: Platform,
    vars: Mutex<HashMap<String, String>>,
}

impl FakeEnvironment {
    /// Create an environment for `platform`.
    pub fn new(working_directory: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            working_directory: working_directory.into(),
            platform,
            vars: Mutex::new(HashMap::new()),
        }
    }

    /// A Linux environment.
    pub fn unix(working_directory: impl Into<PathBuf>) -> Self {
        Self::new(working_directory, Platform::new(Os::Linux))
    }

    /// A Windows environment.
    pub fn windows(working_directory: impl Into<PathBuf>) -> Self {
        Self::new(working_directory, Platform::new(Os::Windows))
    }

    /// Set a variable.
    pub fn set_var(&self, name: impl Into<String>, value: impl Into<String>) {
        self.vars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }
}

impl HostEnvironment for FakeEnvironment {
    fn working_directory(&self) -> PathBuf {
        self.working_directory.clone()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.vars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

/// Scripted behaviour of processes started by [`FakeProcessRunner`].
#[derive(Debug, Clone, Default)]
pub struct FakeProcessBehavior {
    /// Exit code reported after exit.
    pub exit_code: i32,
    /// Lines reported as standard output.
    pub standard_output: Vec<String>,
    /// Lines reported as standard error.
    pub standard_error: Vec<String>,
    /// Refuse to start.
    pub fail_to_start: bool,
    /// Never exit on its own; waits with a timeout report a timeout.
    pub hang: bool,
}

/// A process launch recorded by [`FakeProcessRunner`].
#[derive(Debug, Clone)]
pub struct RecordedLaunch {
    /// Executable that was started.
    pub program: PathBuf,
    /// Argument vector it received.
    pub args: Vec<String>,
    /// Settings it was started with.
    pub settings: ProcessSettings,
}

/// Process runner that records launches instead of spawning anything.
#[derive(Debug, Default)]
pub struct FakeProcessRunner {
    behavior: Mutex<FakeProcessBehavior>,
    launches: Mutex<Vec<RecordedLaunch>>,
    killed: Arc<AtomicBool>,
}

impl FakeProcessRunner {
    /// Runner whose processes exit with code 0 and print nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner whose processes behave as described.
    #[must_use]
    pub fn with_behavior(behavior: FakeProcessBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            ..Self::default()
        }
    }

    /// Runner whose processes exit with `code`.
    #[must_use]
    pub fn exiting_with(code: i32) -> Self {
        Self::with_behavior(FakeProcessBehavior {
            exit_code: code,
            ..FakeProcessBehavior::default()
        })
    }

    /// Every launch so far, oldest first.
    #[must_use]
    pub fn launches(&self) -> Vec<RecordedLaunch> {
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent launch.
    #[must_use]
    pub fn last_launch(&self) -> Option<RecordedLaunch> {
        self.launches().pop()
    }

    /// Whether any started process was killed.
    #[must_use]
    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessRunner for FakeProcessRunner {
    async fn start(
        &self,
        program: &Path,
        args: &[String],
        settings: &ProcessSettings,
    ) -> io::Result<Box<dyn ToolProcess>> {
        self.launches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedLaunch {
                program: program.to_path_buf(),
                args: args.to_vec(),
                settings: settings.clone(),
            });

        let behavior = self
            .behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if behavior.fail_to_start {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        Ok(Box::new(FakeProcess {
            behavior,
            capture_stdout: settings.redirect_standard_output,
            capture_stderr: settings.redirect_standard_error,
            exited: false,
            killed: Arc::clone(&self.killed),
        }))
    }
}

#[derive(Debug)]
struct FakeProcess {
    behavior: FakeProcessBehavior,
    capture_stdout: bool,
    capture_stderr: bool,
    exited: bool,
    killed: Arc<AtomicBool>,
}

#[async_trait]
impl ToolProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        (!self.exited).then_some(4242)
    }

    async fn wait_for_exit(&mut self, timeout: Option<Duration>) -> crate::Result<bool> {
        if self.behavior.hang && timeout.is_some() {
            return Ok(false);
        }
        self.exited = true;
        Ok(true)
    }

    async fn kill(&mut self) -> crate::Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exit_code(&self) -> Option<i32> {
        self.exited.then_some(self.behavior.exit_code)
    }

    fn standard_output(&self) -> &[String] {
        if self.exited && self.capture_stdout {
            &self.behavior.standard_output
        } else {
            &[]
        }
    }

    fn standard_error(&self) -> &[String] {
        if self.exited && self.capture_stderr {
            &self.behavior.standard_error
        } else {
            &[]
        }
    }
}
