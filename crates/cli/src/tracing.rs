//! Tracing configuration for the toolrun CLI

use std::io;
pub use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above
    Info,
    /// Show warnings and above (default)
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level: Level,
    pub json: bool,
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN, // Default to quiet operation
            json: false,
            filter: None,
        }
    }
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("toolrun={level},toolrun_core={level},toolrun_tools_nunit={level}")
}

/// Initialize tracing with the given configuration
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: TracingConfig) -> miette::Result<()> {
    let env_filter = if let Some(filter) = config.filter {
        EnvFilter::try_new(filter)
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_directives(config.level)))
    }
    .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_current_span(true);
        registry.with(layer).init();
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_target(false);
        registry.with(layer).init();
    }

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        json = config.json,
        "Tracing initialized for toolrun CLI"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_conversion() {
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives(Level::INFO),
            "toolrun=info,toolrun_core=info,toolrun_tools_nunit=info"
        );
    }
}
