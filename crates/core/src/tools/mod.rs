//! Tool resolution.
//!
//! # Architecture
//!
//! - [`ToolRegistry`] - explicitly pinned tool paths, indexed by file name
//! - [`ResolutionStrategy`] - turns candidate names into a path
//!   ([`DefaultResolutionStrategy`]: registry, tools directory, `PATH`)
//! - [`ToolLocator`] - facade combining the two; what tool wrappers use
//! - [`Platform`] and [`platform_order`] - native names before Windows-style
//!   names, or the reverse on Windows
//!
//! # Example
//!
//! ```ignore
//! use toolrun_core::tools::ToolLocator;
//!
//! let locator = ToolLocator::with_defaults(fs, environment, configuration);
//! locator.register_file("/opt/nunit/nunit3-console.exe")?;
//! let path = locator.resolve_any(&["nunit3-console", "nunit3-console.exe"])?;
//! ```

mod locator;
mod platform;
mod registry;
mod strategy;

pub use locator::ToolLocator;
pub use platform::{
    Os, Platform, WINDOWS_SUFFIXES, is_windows_style, platform_order, split_path_list,
};
pub use registry::{NameComparison, ToolRegistry};
pub use strategy::{
    DEFAULT_TOOLS_DIRECTORY, DefaultResolutionStrategy, ResolutionStrategy, ResolutionTier,
};
