//! Process execution.
//!
//! [`ProcessRunner`] launches an executable and hands back a [`ToolProcess`]
//! that can be waited on with an optional timeout. [`TokioProcessRunner`] is
//! the production implementation.

mod runner;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;
use crate::arguments::ProcessArguments;

pub use runner::{TokioProcess, TokioProcessRunner};

/// Launch settings for one process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSettings {
    /// Arguments passed to the executable.
    pub arguments: ProcessArguments,
    /// Working directory; `None` inherits the parent's.
    pub working_directory: Option<PathBuf>,
    /// Variables set on top of the inherited environment.
    pub environment_variables: BTreeMap<String, String>,
    /// Capture standard output line by line.
    pub redirect_standard_output: bool,
    /// Capture standard error line by line.
    pub redirect_standard_error: bool,
    /// Do not log the command line.
    pub silent: bool,
}

/// A running or finished process.
#[async_trait]
pub trait ToolProcess: Send {
    /// OS process id, while the process is alive.
    fn id(&self) -> Option<u32>;

    /// Wait for the process to exit.
    ///
    /// Returns `Ok(false)` if `timeout` elapsed first; the process is left
    /// running in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting on the process fails.
    async fn wait_for_exit(&mut self, timeout: Option<Duration>) -> Result<bool>;

    /// Forcibly terminate the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be signalled.
    async fn kill(&mut self) -> Result<()>;

    /// Exit code, once the process has exited.
    fn exit_code(&self) -> Option<i32>;

    /// Captured standard output lines, in order.
    fn standard_output(&self) -> &[String];

    /// Captured standard error lines, in order.
    fn standard_error(&self) -> &[String];
}

/// Starts processes.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Launch `program` with the already split `args` and `settings`.
    ///
    /// `settings.arguments` is only used for logging; `args` is what the
    /// process receives.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the process could not be started.
    async fn start(
        &self,
        program: &Path,
        args: &[String],
        settings: &ProcessSettings,
    ) -> std::io::Result<Box<dyn ToolProcess>>;
}
