//! Generic command execution for tools without a dedicated wrapper.

use crate::arguments::ProcessArgumentBuilder;
use crate::invocation::{ToolDescriptor, ToolOutcome, ToolRunner, ToolSettings};
use crate::Result;

/// An ad hoc tool: its display name, acceptable executables and settings.
#[derive(Debug, Clone, Default)]
pub struct CommandSettings {
    /// Display name used in errors. Defaults to the first executable name.
    pub tool_name: Option<String>,
    /// Acceptable executable names.
    pub executable_names: Vec<String>,
    /// Settings for the run itself.
    pub tool: ToolSettings,
}

impl CommandSettings {
    /// Settings for a command found under any of `executable_names`.
    pub fn new<I, S>(executable_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            executable_names: executable_names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Override the display name.
    #[must_use]
    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = Some(name.into());
        self
    }

    /// Replace the run settings.
    #[must_use]
    pub fn with_tool_settings(mut self, tool: ToolSettings) -> Self {
        self.tool = tool;
        self
    }

    fn descriptor(&self) -> ToolDescriptor {
        let name = self
            .tool_name
            .clone()
            .or_else(|| self.executable_names.first().cloned())
            .unwrap_or_default();
        ToolDescriptor::new(name, self.executable_names.iter().cloned())
    }
}

/// Runs [`CommandSettings`] through a [`ToolRunner`].
#[derive(Debug, Clone)]
pub struct CommandRunner {
    runner: ToolRunner,
}

impl CommandRunner {
    /// Create a command runner.
    #[must_use]
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }

    /// Run the command and return its exit code.
    ///
    /// # Errors
    ///
    /// Same as [`ToolRunner::run`].
    pub async fn run(
        &self,
        settings: &CommandSettings,
        arguments: ProcessArgumentBuilder,
    ) -> Result<i32> {
        let outcome = self
            .runner
            .run(&settings.descriptor(), &settings.tool, arguments)
            .await?;
        Ok(outcome.exit_code)
    }

    /// Run the command and capture its output.
    ///
    /// # Errors
    ///
    /// Same as [`ToolRunner::run_with_output`].
    pub async fn run_with_output(
        &self,
        settings: &CommandSettings,
        arguments: ProcessArgumentBuilder,
    ) -> Result<ToolOutcome> {
        self.runner
            .run_with_output(&settings.descriptor(), &settings.tool, arguments)
            .await
    }
}
