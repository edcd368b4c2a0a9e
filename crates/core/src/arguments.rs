//! Process argument building.
//!
//! [`ProcessArgumentBuilder`] keeps arguments as structured values so the
//! same list can be spawned as an argv vector, rendered as a command line,
//! or rendered with secrets redacted for logging.

use std::fmt;

use crate::{Error, Result};

/// Text substituted for secret values in [`ProcessArgumentBuilder::render_safe`].
pub const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Argument {
    /// Switch text rendered verbatim before the value (`--result=`).
    prefix: String,
    value: String,
    quoted: bool,
    secret: bool,
}

impl Argument {
    fn render(&self, redact: bool) -> String {
        let value = if redact && self.secret {
            REDACTED.to_string()
        } else if self.quoted {
            quote(&self.value)
        } else {
            self.value.clone()
        };
        format!("{}{}", self.prefix, value)
    }

    fn to_arg(&self) -> String {
        format!("{}{}", self.prefix, self.value)
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

/// Ordered list of process arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessArgumentBuilder {
    arguments: Vec<Argument>,
}

impl ProcessArgumentBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, prefix: String, value: impl Into<String>, quoted: bool, secret: bool) -> &mut Self {
        self.arguments.push(Argument {
            prefix,
            value: value.into(),
            quoted,
            secret,
        });
        self
    }

    /// Whitespace separators produce two arguments (`--flag`, `value`);
    /// anything else is glued into one (`--flag=value`).
    fn push_switch(
        &mut self,
        switch: &str,
        separator: &str,
        value: impl Into<String>,
        quoted: bool,
        secret: bool,
    ) -> &mut Self {
        if separator.trim().is_empty() {
            self.push(String::new(), switch, false, false);
            self.push(String::new(), value, quoted, secret)
        } else {
            self.push(format!("{switch}{separator}"), value, quoted, secret)
        }
    }

    /// Append a plain argument.
    pub fn append(&mut self, value: impl Into<String>) -> &mut Self {
        self.push(String::new(), value, false, false)
    }

    /// Append an argument rendered inside double quotes.
    pub fn append_quoted(&mut self, value: impl Into<String>) -> &mut Self {
        self.push(String::new(), value, true, false)
    }

    /// Append an argument that is redacted from logged command lines.
    pub fn append_secret(&mut self, value: impl Into<String>) -> &mut Self {
        self.push(String::new(), value, false, true)
    }

    /// Append a quoted argument that is redacted from logged command lines.
    pub fn append_quoted_secret(&mut self, value: impl Into<String>) -> &mut Self {
        self.push(String::new(), value, true, true)
    }

    /// Append `switch`, `separator` and `value`.
    pub fn append_switch(
        &mut self,
        switch: &str,
        separator: &str,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push_switch(switch, separator, value, false, false)
    }

    /// Like [`append_switch`](Self::append_switch) with the value quoted.
    pub fn append_switch_quoted(
        &mut self,
        switch: &str,
        separator: &str,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push_switch(switch, separator, value, true, false)
    }

    /// Like [`append_switch`](Self::append_switch) with the value redacted
    /// from logged command lines.
    pub fn append_switch_secret(
        &mut self,
        switch: &str,
        separator: &str,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push_switch(switch, separator, value, false, true)
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// Whether no arguments were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// The command line, with quoting applied.
    #[must_use]
    pub fn render(&self) -> String {
        self.render_with(false)
    }

    /// The command line with secret values replaced by [`REDACTED`].
    #[must_use]
    pub fn render_safe(&self) -> String {
        self.render_with(true)
    }

    fn render_with(&self, redact: bool) -> String {
        self.arguments
            .iter()
            .map(|arg| arg.render(redact))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// One entry per argument, without shell quoting.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        self.arguments.iter().map(Argument::to_arg).collect()
    }
}

impl fmt::Display for ProcessArgumentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_safe())
    }
}

/// Final arguments of an invocation.
///
/// Argument customization returns one of these. Either variant replaces the
/// arguments it was given; nothing is appended implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessArguments {
    /// Structured arguments.
    Builder(ProcessArgumentBuilder),
    /// A complete pre-rendered command line.
    Raw(String),
}

impl ProcessArguments {
    /// The command line as passed to the tool.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Builder(builder) => builder.render(),
            Self::Raw(line) => line.clone(),
        }
    }

    /// The command line with secrets redacted. Raw lines carry no secret
    /// markers and are returned unchanged.
    #[must_use]
    pub fn render_safe(&self) -> String {
        match self {
            Self::Builder(builder) => builder.render_safe(),
            Self::Raw(line) => line.clone(),
        }
    }

    /// The argv vector used to spawn the process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a raw line has unbalanced quotes.
    pub fn to_args(&self) -> Result<Vec<String>> {
        match self {
            Self::Builder(builder) => Ok(builder.to_args()),
            Self::Raw(line) => shlex::split(line).ok_or_else(|| {
                Error::invalid_argument("arguments", format!("Unbalanced quotes in '{line}'."))
            }),
        }
    }
}

impl Default for ProcessArguments {
    fn default() -> Self {
        Self::Builder(ProcessArgumentBuilder::new())
    }
}

impl From<ProcessArgumentBuilder> for ProcessArguments {
    fn from(builder: ProcessArgumentBuilder) -> Self {
        Self::Builder(builder)
    }
}

impl From<&mut ProcessArgumentBuilder> for ProcessArguments {
    fn from(builder: &mut ProcessArgumentBuilder) -> Self {
        Self::Builder(builder.clone())
    }
}

impl From<String> for ProcessArguments {
    fn from(line: String) -> Self {
        Self::Raw(line)
    }
}

impl From<&str> for ProcessArguments {
    fn from(line: &str) -> Self {
        Self::Raw(line.to_string())
    }
}
