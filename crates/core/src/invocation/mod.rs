//! Tool invocation.
//!
//! A tool wrapper describes its tool once with a [`ToolDescriptor`] and
//! hands each run a [`ToolSettings`] plus the arguments it built. The
//! [`ToolRunner`] then:
//!
//! 1. resolves the executable (explicit path first, then the locator),
//! 2. applies the argument customization, which replaces the arguments,
//! 3. launches the process with the requested working directory and
//!    environment,
//! 4. waits, killing the process if the timeout elapses,
//! 5. runs the post action on the exited process, then checks its exit code.

mod descriptor;
mod runner;
mod settings;

use std::fmt;

pub use descriptor::{ExitCodeDescriber, ToolDescriptor};
pub use runner::ToolRunner;
pub use settings::{
    ArgumentCustomization, ExitCodeHandler, PostAction, ProcessSettingsSetup, ToolSettings,
};

/// Where an invocation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationState {
    /// Nothing has happened yet.
    NotStarted,
    /// Looking for the executable.
    Resolving,
    /// The process is running.
    Launched,
    /// The process exited and its code is being checked.
    Exited,
    /// The post action ran and the exit code was accepted.
    Succeeded,
    /// Resolution, launch, timeout or exit-code check failed.
    Failed,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::Resolving => "resolving",
            Self::Launched => "launched",
            Self::Exited => "exited",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Exit code the policy accepted.
    pub exit_code: i32,
    /// Captured standard output lines; empty unless output was captured.
    pub standard_output: Vec<String>,
    /// Captured standard error lines; empty unless output was captured.
    pub standard_error: Vec<String>,
}

impl ToolOutcome {
    /// Standard output joined with newlines.
    #[must_use]
    pub fn stdout(&self) -> String {
        self.standard_output.join("\n")
    }

    /// Standard error joined with newlines.
    #[must_use]
    pub fn stderr(&self) -> String {
        self.standard_error.join("\n")
    }
}
