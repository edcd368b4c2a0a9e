//! NUnit 3 console runner wrapper for toolrun.
//!
//! Runs test assemblies with `nunit3-console`. Supports:
//! - Test selection with `--where` expressions
//! - Parallel workers
//! - Result file output, or none at all
//! - Test name labels
//! - Forcing a 32-bit process
//!
//! Non-zero exit codes are translated into the runner's own meaning, e.g.
//! `-2` is an invalid assembly and `3` means three tests failed.

use std::fmt;
use std::path::{Path, PathBuf};
use toolrun_core::arguments::ProcessArgumentBuilder;
use toolrun_core::invocation::{ToolDescriptor, ToolRunner, ToolSettings};
use toolrun_core::{Error, Result};
use tracing::debug;

/// Display name used in errors.
pub const TOOL_NAME: &str = "NUnit3";

/// Executable names, native name first.
pub const EXECUTABLE_NAMES: [&str; 2] = ["nunit3-console", "nunit3-console.exe"];

/// When test names are written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Labels {
    /// No labels.
    #[default]
    Off,
    /// Label tests that produce output.
    On,
    /// Label every test before it runs.
    Before,
    /// Label every test after it runs.
    After,
    /// Label every test before and after it runs.
    All,
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Off => "Off",
            Self::On => "On",
            Self::Before => "Before",
            Self::After => "After",
            Self::All => "All",
        };
        f.write_str(value)
    }
}

/// Options for one `nunit3-console` run.
#[derive(Debug, Clone, Default)]
pub struct NUnit3Settings {
    /// Test selection expression.
    pub r#where: Option<String>,
    /// Number of worker threads.
    pub workers: Option<u32>,
    /// Result file. Relative paths are resolved against the working directory.
    pub result: Option<PathBuf>,
    /// Do not write a result file.
    pub no_result: bool,
    /// Label output with test names.
    pub labels: Labels,
    /// Run in a 32-bit process.
    pub x86: bool,
    /// Generic tool settings.
    pub tool: ToolSettings,
}

/// Exit code meaning for `nunit3-console`.
///
/// Positive codes count failed tests.
#[must_use]
pub fn describe_exit_code(exit_code: i32) -> Option<String> {
    let message = match exit_code {
        -1 => "Invalid argument".to_string(),
        -2 => "Invalid assembly".to_string(),
        -4 => "Invalid test fixture".to_string(),
        -5 => "Unload error".to_string(),
        -100 => "Unexpected error".to_string(),
        n if n > 0 => format!("{n} test(s) failed"),
        _ => return None,
    };
    Some(message)
}

/// The NUnit 3 console runner.
#[must_use]
pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(TOOL_NAME, EXECUTABLE_NAMES).with_exit_code_messages(describe_exit_code)
}

/// Runs test assemblies with `nunit3-console`.
#[derive(Debug, Clone)]
pub struct NUnit3Runner {
    runner: ToolRunner,
    tool: ToolDescriptor,
}

impl NUnit3Runner {
    /// Create a runner on top of a [`ToolRunner`].
    #[must_use]
    pub fn new(runner: ToolRunner) -> Self {
        Self {
            runner,
            tool: descriptor(),
        }
    }

    /// Run the tests in `assemblies`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no assembly is given, and
    /// [`Error::ExitCode`] with the runner's explanation when tests fail.
    pub async fn run<P: AsRef<Path>>(&self, assemblies: &[P], settings: &NUnit3Settings) -> Result<()> {
        if assemblies.is_empty() {
            return Err(Error::invalid_argument(
                "assemblies",
                "At least one test assembly is required.",
            ));
        }
        let arguments = self.arguments(assemblies, settings);
        debug!(assemblies = assemblies.len(), "Running NUnit tests");
        self.runner.run(&self.tool, &settings.tool, arguments).await?;
        Ok(())
    }

    fn arguments<P: AsRef<Path>>(
        &self,
        assemblies: &[P],
        settings: &NUnit3Settings,
    ) -> ProcessArgumentBuilder {
        let environment = self.runner.locator().environment();
        let mut args = ProcessArgumentBuilder::new();

        for assembly in assemblies {
            let path = environment.make_absolute(assembly.as_ref());
            args.append_quoted(path.display().to_string());
        }
        if let Some(expression) = &settings.r#where {
            args.append_switch_quoted("--where", "=", expression.as_str());
        }
        if let Some(workers) = settings.workers {
            args.append_switch("--workers", "=", workers.to_string());
        }
        if settings.no_result {
            args.append("--noresult");
        } else if let Some(result) = &settings.result {
            let path = environment.make_absolute(result);
            args.append_switch_quoted("--result", "=", path.display().to_string());
        }
        if settings.labels != Labels::Off {
            args.append_switch("--labels", "=", settings.labels.to_string());
        }
        if settings.x86 {
            args.append("--x86");
        }
        args
    }
}
