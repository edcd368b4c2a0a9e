//! Error types for toolrun-core

use miette::Diagnostic;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for tool resolution and invocation
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A caller supplied an empty or otherwise invalid argument
    #[error("Invalid argument '{parameter}': {message}")]
    #[diagnostic(code(toolrun::argument::invalid))]
    InvalidArgument {
        /// Name of the offending parameter
        parameter: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// No tier of the resolution strategy produced an executable
    #[error("{tool}: Could not locate executable.")]
    #[diagnostic(
        code(toolrun::tool::not_found),
        help("Install the tool, add it to PATH, place it in the tools directory, or set an explicit tool path")
    )]
    ToolNotFound {
        /// Display name of the tool
        tool: String,
    },

    /// The executable was found but the process could not be launched
    #[error("{tool}: Process was not started.")]
    #[diagnostic(code(toolrun::process::not_started))]
    ProcessNotStarted {
        /// Display name of the tool
        tool: String,
        /// Why the launch failed
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a code the exit-code policy rejected
    #[error("{tool}: {message}")]
    #[diagnostic(code(toolrun::process::exit_code))]
    ExitCode {
        /// Display name of the tool
        tool: String,
        /// Raw exit code reported by the process
        exit_code: i32,
        /// Human-readable explanation
        message: String,
    },

    /// The process outlived its configured timeout and was killed
    #[error("{tool}: Process timed out after {}ms.", timeout.as_millis())]
    #[diagnostic(code(toolrun::process::timeout))]
    Timeout {
        /// Display name of the tool
        tool: String,
        /// The configured limit
        timeout: Duration,
    },

    /// I/O error with path context
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(toolrun::io::error))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path where the I/O error occurred, if applicable
        path: Option<Box<std::path::Path>>,
        /// Description of the operation that failed
        operation: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(toolrun::config::invalid))]
    Configuration {
        /// The error message describing the configuration issue
        message: String,
    },
}

impl Error {
    /// Create an invalid argument error for `parameter`
    pub fn invalid_argument(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter,
            message: message.into(),
        }
    }

    /// Create the error used for blank tool names
    #[must_use]
    pub fn empty_tool_name(parameter: &'static str) -> Self {
        Self::invalid_argument(parameter, "Tool name cannot be empty.")
    }

    /// Create a tool-not-found error
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a process-not-started error
    pub fn process_not_started(tool: impl Into<String>, source: std::io::Error) -> Self {
        Self::ProcessNotStarted {
            tool: tool.into(),
            source,
        }
    }

    /// Create an exit-code error with the generic message
    pub fn exit_code(tool: impl Into<String>, exit_code: i32) -> Self {
        Self::ExitCode {
            tool: tool.into(),
            exit_code,
            message: format!("Process returned an error (exit code {exit_code})."),
        }
    }

    /// Create an exit-code error with a tool-specific message
    pub fn exit_code_with_message(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::ExitCode {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(tool: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            tool: tool.into(),
            timeout,
        }
    }

    /// Create an I/O error with context
    pub fn io(source: std::io::Error, path: Option<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.map(PathBuf::into_boxed_path),
            operation: operation.into(),
        }
    }

    /// Create a configuration error with a message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// The exit code carried by this error, if it is an exit-code failure
    #[must_use]
    pub fn process_exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitCode { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

/// Result type for toolrun-core operations
pub type Result<T> = std::result::Result<T, Error>;
