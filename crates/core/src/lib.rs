//! Tool resolution and invocation for build scripts.
//!
//! This crate provides:
//! - A per-session [`tools::ToolRegistry`] of pinned tool locations
//! - A tiered resolution strategy (registry, tools directory, `PATH`) with
//!   platform affinity and tolerance for unreadable `PATH` entries
//! - The [`tools::ToolLocator`] facade tool wrappers depend on
//! - The [`invocation`] framework that launches a tool, applies argument
//!   customization, enforces exit-code policy and timeouts, and runs post
//!   actions
//!
//! # Overview
//!
//! ```no_run
//! use std::sync::Arc;
//! use toolrun_core::arguments::ProcessArgumentBuilder;
//! use toolrun_core::config::BuildConfiguration;
//! use toolrun_core::environment::SystemEnvironment;
//! use toolrun_core::fs::LocalFileSystem;
//! use toolrun_core::invocation::{ToolDescriptor, ToolRunner, ToolSettings};
//! use toolrun_core::process::TokioProcessRunner;
//! use toolrun_core::tools::ToolLocator;
//!
//! # async fn example() -> toolrun_core::Result<()> {
//! let environment = Arc::new(SystemEnvironment::new());
//! let configuration = BuildConfiguration::load(std::path::Path::new("."))?;
//! let locator = ToolLocator::with_defaults(
//!     Arc::new(LocalFileSystem),
//!     environment,
//!     Arc::new(configuration),
//! );
//! let runner = ToolRunner::new(locator, Arc::new(TokioProcessRunner::new()));
//!
//! let git = ToolDescriptor::new("Git", ["git", "git.exe"]);
//! let mut args = ProcessArgumentBuilder::new();
//! args.append("status");
//! runner.run(&git, &ToolSettings::new(), args).await?;
//! # Ok(())
//! # }
//! ```

pub mod arguments;
pub mod command;
pub mod config;
pub mod environment;
pub mod error;
pub mod fs;
pub mod invocation;
pub mod process;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tools;

pub use error::{Error, Result};
