//! Static description of a tool supplied by its wrapper.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::settings::ExitCodeHandler;
use crate::{Error, Result};

/// Maps an exit code to a tool-specific explanation.
pub type ExitCodeDescriber = Arc<dyn Fn(i32) -> Option<String> + Send + Sync>;

/// What a tool wrapper knows about its tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    executable_names: Vec<String>,
    working_directory: Option<PathBuf>,
    exit_code_predicate: Option<ExitCodeHandler>,
    exit_code_describer: Option<ExitCodeDescriber>,
}

impl ToolDescriptor {
    /// Describe a tool by display name and acceptable executable names.
    pub fn new<I, S>(name: impl Into<String>, executable_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            executable_names: executable_names.into_iter().map(Into::into).collect(),
            working_directory: None,
            exit_code_predicate: None,
            exit_code_describer: None,
        }
    }

    /// Working directory used when settings do not specify one.
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Exit-code policy used when settings do not specify one.
    #[must_use]
    pub fn with_exit_code_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(i32) -> bool + Send + Sync + 'static,
    {
        self.exit_code_predicate = Some(Arc::new(predicate));
        self
    }

    /// Explanations for rejected exit codes. Codes mapped to `None` fall
    /// back to the generic message.
    #[must_use]
    pub fn with_exit_code_messages<F>(mut self, describe: F) -> Self
    where
        F: Fn(i32) -> Option<String> + Send + Sync + 'static,
    {
        self.exit_code_describer = Some(Arc::new(describe));
        self
    }

    /// Display name used in errors and logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acceptable executable names, in the wrapper's preferred order.
    #[must_use]
    pub fn executable_names(&self) -> &[String] {
        &self.executable_names
    }

    /// Default working directory, if the wrapper has one.
    #[must_use]
    pub fn working_directory(&self) -> Option<&PathBuf> {
        self.working_directory.as_ref()
    }

    /// Default exit-code policy, if the wrapper has one.
    #[must_use]
    pub fn exit_code_predicate(&self) -> Option<&ExitCodeHandler> {
        self.exit_code_predicate.as_ref()
    }

    /// The error for a rejected exit code.
    #[must_use]
    pub fn exit_code_error(&self, exit_code: i32) -> Error {
        match self
            .exit_code_describer
            .as_ref()
            .and_then(|describe| describe(exit_code))
        {
            Some(message) => Error::exit_code_with_message(&self.name, exit_code, message),
            None => Error::exit_code(&self.name, exit_code),
        }
    }

    /// Check that the descriptor names a tool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank name or an empty or
    /// blank executable name list.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::empty_tool_name("tool_name"));
        }
        if self.executable_names.is_empty() {
            return Err(Error::invalid_argument(
                "executable_names",
                "At least one tool executable name is required.",
            ));
        }
        if self.executable_names.iter().any(|n| n.trim().is_empty()) {
            return Err(Error::empty_tool_name("executable_names"));
        }
        Ok(())
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("executable_names", &self.executable_names)
            .field("working_directory", &self.working_directory)
            .finish_non_exhaustive()
    }
}
