//! Per-invocation tool settings.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::arguments::{ProcessArgumentBuilder, ProcessArguments};
use crate::process::{ProcessSettings, ToolProcess};

/// Rewrites the arguments of an invocation. The result replaces them.
pub type ArgumentCustomization =
    Arc<dyn Fn(ProcessArgumentBuilder) -> ProcessArguments + Send + Sync>;

/// Decides whether an exit code counts as success.
pub type ExitCodeHandler = Arc<dyn Fn(i32) -> bool + Send + Sync>;

/// Runs against the finished process before the invocation returns.
pub type PostAction = Arc<dyn Fn(&dyn ToolProcess) + Send + Sync>;

/// Adjusts launch settings right before the process starts.
pub type ProcessSettingsSetup = Arc<dyn Fn(&mut ProcessSettings) + Send + Sync>;

/// Caller-owned configuration of one tool run.
#[derive(Clone, Default)]
pub struct ToolSettings {
    /// Executable to run instead of resolving one.
    pub tool_path: Option<PathBuf>,
    /// Working directory for the process.
    pub working_directory: Option<PathBuf>,
    /// Start the process without setting a working directory.
    pub no_working_directory: bool,
    /// Variables set on top of the inherited environment.
    pub environment_variables: BTreeMap<String, String>,
    /// Rewrites the arguments before launch.
    pub argument_customization: Option<ArgumentCustomization>,
    /// Defaults to accepting exactly `0`.
    pub handle_exit_code: Option<ExitCodeHandler>,
    /// Kill the process if it runs longer than this.
    pub timeout: Option<Duration>,
    /// Called with the finished process.
    pub post_action: Option<PostAction>,
    /// Last-minute changes to the launch settings.
    pub setup_process_settings: Option<ProcessSettingsSetup>,
}

impl ToolSettings {
    /// Settings with every option unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `path` instead of resolving the tool.
    #[must_use]
    pub fn with_tool_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tool_path = Some(path.into());
        self
    }

    /// Run the process in `dir`.
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Do not set a working directory at all.
    #[must_use]
    pub fn without_working_directory(mut self) -> Self {
        self.no_working_directory = true;
        self
    }

    /// Set one environment variable for the process.
    #[must_use]
    pub fn with_environment_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }

    /// Replace the arguments with whatever `customize` returns.
    ///
    /// Returning the (possibly modified) builder, a new builder, or a raw
    /// command line are all accepted; in every case the result is used as is.
    #[must_use]
    pub fn with_argument_customization<F, A>(mut self, customize: F) -> Self
    where
        F: Fn(ProcessArgumentBuilder) -> A + Send + Sync + 'static,
        A: Into<ProcessArguments>,
    {
        self.argument_customization = Some(Arc::new(move |args| customize(args).into()));
        self
    }

    /// Accept exit codes for which `handler` returns true.
    #[must_use]
    pub fn with_exit_code_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(i32) -> bool + Send + Sync + 'static,
    {
        self.handle_exit_code = Some(Arc::new(handler));
        self
    }

    /// Kill the process after `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run `action` once the process has exited, before its exit code is
    /// checked. It also runs for rejected exit codes, but not on timeout.
    #[must_use]
    pub fn with_post_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&dyn ToolProcess) + Send + Sync + 'static,
    {
        self.post_action = Some(Arc::new(action));
        self
    }

    /// Adjust the launch settings right before the process starts.
    #[must_use]
    pub fn with_process_settings_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut ProcessSettings) + Send + Sync + 'static,
    {
        self.setup_process_settings = Some(Arc::new(setup));
        self
    }

    /// Apply the argument customization, if any.
    #[must_use]
    pub fn customize_arguments(&self, arguments: ProcessArgumentBuilder) -> ProcessArguments {
        match &self.argument_customization {
            Some(customize) => customize(arguments),
            None => ProcessArguments::Builder(arguments),
        }
    }
}

impl fmt::Debug for ToolSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSettings")
            .field("tool_path", &self.tool_path)
            .field("working_directory", &self.working_directory)
            .field("no_working_directory", &self.no_working_directory)
            .field(
                "environment_variables",
                &self.environment_variables.keys().collect::<Vec<_>>(),
            )
            .field("argument_customization", &self.argument_customization.is_some())
            .field("handle_exit_code", &self.handle_exit_code.is_some())
            .field("timeout", &self.timeout)
            .field("post_action", &self.post_action.is_some())
            .field("setup_process_settings", &self.setup_process_settings.is_some())
            .finish()
    }
}
