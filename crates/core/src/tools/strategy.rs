//! Multi-tier executable resolution.
//!
//! Tiers are consulted in a fixed order and the first hit wins:
//!
//! 1. the [`ToolRegistry`]
//! 2. the tools directory (`<working dir>/tools`, or the `paths_tools` setting)
//! 3. every directory of `PATH`, in declaration order
//!
//! Inside each tier candidate names are tried in [`platform_order`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::platform::{platform_order, split_path_list};
use super::registry::ToolRegistry;
use crate::config::{Configuration, TOOLS_PATH_KEY};
use crate::environment::{HostEnvironment, PATH_VARIABLE};
use crate::fs::FileSystem;
use crate::{Error, Result};

/// Name of the default tools directory under the working directory.
pub const DEFAULT_TOOLS_DIRECTORY: &str = "tools";

/// Resolution tier that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// A registered path.
    Registry,
    /// A file in the tools directory.
    ToolsDirectory,
    /// A file in one of the `PATH` directories.
    Path,
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => write!(f, "registry"),
            Self::ToolsDirectory => write!(f, "tools-directory"),
            Self::Path => write!(f, "path"),
        }
    }
}

/// Turns candidate executable names into a path.
pub trait ResolutionStrategy: Send + Sync {
    /// Resolve the first matching candidate, or `None` if no tier matches.
    ///
    /// `tools_directory` replaces the configured tools directory for this
    /// call when set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `names` has no non-blank entry.
    fn resolve(
        &self,
        registry: &ToolRegistry,
        names: &[&str],
        tools_directory: Option<&Path>,
    ) -> Result<Option<PathBuf>>;
}

/// Registry, then tools directory, then `PATH`.
#[derive(Clone)]
pub struct DefaultResolutionStrategy {
    fs: Arc<dyn FileSystem>,
    environment: Arc<dyn HostEnvironment>,
    configuration: Arc<dyn Configuration>,
}

impl DefaultResolutionStrategy {
    /// Create a strategy over the given collaborators.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        environment: Arc<dyn HostEnvironment>,
        configuration: Arc<dyn Configuration>,
    ) -> Self {
        Self {
            fs,
            environment,
            configuration,
        }
    }

    /// The directory scanned by the tools-directory tier.
    #[must_use]
    pub fn tools_directory(&self, tools_directory: Option<&Path>) -> PathBuf {
        let configured = self
            .configuration
            .get_value(TOOLS_PATH_KEY)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        match tools_directory.map(Path::to_path_buf).or(configured) {
            Some(dir) => self.environment.make_absolute(&dir),
            None => self
                .environment
                .working_directory()
                .join(DEFAULT_TOOLS_DIRECTORY),
        }
    }

    fn from_registry(registry: &ToolRegistry, names: &[&str]) -> Option<PathBuf> {
        names.iter().find_map(|name| registry.lookup(name))
    }

    fn from_tools_directory(&self, dir: &Path, names: &[&str]) -> Option<PathBuf> {
        names.iter().find_map(|name| {
            let candidate = dir.join(name);
            match self.fs.exists(&candidate) {
                Ok(true) => Some(candidate),
                Ok(false) => None,
                Err(e) => {
                    tracing::debug!(
                        path = %candidate.display(),
                        error = %e,
                        "Ignoring unreadable tools directory candidate"
                    );
                    None
                }
            }
        })
    }

    fn from_path_variable(&self, names: &[&str]) -> Option<PathBuf> {
        let value = self.environment.env_var(PATH_VARIABLE)?;
        let platform = self.environment.platform();

        for dir in split_path_list(&value, &platform) {
            let dir = self.environment.make_absolute(Path::new(&dir));
            match self.first_in_directory(&dir, names) {
                Ok(Some(path)) => return Some(path),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        directory = %dir.display(),
                        error = %e,
                        "Skipping PATH entry that could not be searched"
                    );
                }
            }
        }
        None
    }

    fn first_in_directory(&self, dir: &Path, names: &[&str]) -> std::io::Result<Option<PathBuf>> {
        for name in names {
            let candidate = dir.join(name);
            if self.fs.exists(&candidate)? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for DefaultResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultResolutionStrategy")
            .field("platform", &self.environment.platform())
            .field("working_directory", &self.environment.working_directory())
            .finish_non_exhaustive()
    }
}

impl ResolutionStrategy for DefaultResolutionStrategy {
    fn resolve(
        &self,
        registry: &ToolRegistry,
        names: &[&str],
        tools_directory: Option<&Path>,
    ) -> Result<Option<PathBuf>> {
        let names = validate_names(names)?;
        let platform = self.environment.platform();
        let ordered = platform_order(&names, &platform);

        let found = Self::from_registry(registry, &ordered)
            .map(|path| (ResolutionTier::Registry, path))
            .or_else(|| {
                let dir = self.tools_directory(tools_directory);
                self.from_tools_directory(&dir, &ordered)
                    .map(|path| (ResolutionTier::ToolsDirectory, path))
            })
            .or_else(|| {
                self.from_path_variable(&ordered)
                    .map(|path| (ResolutionTier::Path, path))
            });

        match found {
            Some((tier, path)) => {
                tracing::debug!(
                    tool = %ordered.join(", "),
                    %platform,
                    %tier,
                    path = %path.display(),
                    "Resolved tool"
                );
                Ok(Some(path))
            }
            None => {
                tracing::debug!(
                    tool = %ordered.join(", "),
                    %platform,
                    "Tool could not be resolved"
                );
                Ok(None)
            }
        }
    }
}

/// Trim candidate names and drop blank ones.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] naming `tool_names` if nothing is left.
pub(crate) fn validate_names<'a>(names: &[&'a str]) -> Result<Vec<&'a str>> {
    let names: Vec<&str> = names
        .iter()
        .copied()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return Err(Error::empty_tool_name("tool_names"));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfiguration;
    use crate::testing::{FakeEnvironment, FakeFileSystem};
    use crate::tools::NameComparison;

    struct Fixture {
        fs: Arc<FakeFileSystem>,
        env: Arc<FakeEnvironment>,
        config: BuildConfiguration,
    }

    impl Fixture {
        fn unix() -> Self {
            Self {
                fs: Arc::new(FakeFileSystem::new()),
                env: Arc::new(FakeEnvironment::unix("/work")),
                config: BuildConfiguration::new(),
            }
        }

        fn windows() -> Self {
            Self {
                fs: Arc::new(FakeFileSystem::new()),
                env: Arc::new(FakeEnvironment::windows(r"C:\work")),
                config: BuildConfiguration::new(),
            }
        }

        fn strategy(&self) -> DefaultResolutionStrategy {
            DefaultResolutionStrategy::new(
                self.fs.clone(),
                self.env.clone(),
                Arc::new(self.config.clone()),
            )
        }
    }

    #[test]
    fn test_registry_tier_wins_over_tools_and_path() {
        let fx = Fixture::unix();
        fx.fs.add_file("/work/tools/tool.exe");
        fx.fs.add_file("/usr/bin/tool.exe");
        fx.env.set_var("PATH", "/usr/bin");
        let registry = ToolRegistry::default();
        registry.register("/pinned/tool.exe").unwrap();

        let path = fx.strategy().resolve(&registry, &["tool.exe"], None).unwrap();
        assert_eq!(path, Some(PathBuf::from("/pinned/tool.exe")));
    }

    #[test]
    fn test_tools_directory_wins_over_path() {
        let fx = Fixture::unix();
        fx.fs.add_file("/work/tools/tool.exe");
        fx.fs.add_file("/tmp/tool.exe");
        fx.env.set_var("PATH", "/tmp");

        let path = fx
            .strategy()
            .resolve(&ToolRegistry::default(), &["tool.exe"], None)
            .unwrap();
        assert_eq!(path, Some(PathBuf::from("/work/tools/tool.exe")));
    }

    #[test]
    fn test_nothing_found_is_absence() {
        let fx = Fixture::unix();
        let path = fx
            .strategy()
            .resolve(&ToolRegistry::default(), &["tool.exe"], None)
            .unwrap();
        assert!(path.is_none());
    }

    #[test]
    fn test_configured_tools_directory_is_relative_to_working_dir() {
        let mut fx = Fixture::unix();
        fx.config.set(TOOLS_PATH_KEY, "build/bin");
        fx.fs.add_file("/work/build/bin/tool");
        fx.fs.add_file("/work/tools/tool");

        let strategy = fx.strategy();
        assert_eq!(strategy.tools_directory(None), PathBuf::from("/work/build/bin"));
        let path = strategy
            .resolve(&ToolRegistry::default(), &["tool"], None)
            .unwrap();
        assert_eq!(path, Some(PathBuf::from("/work/build/bin/tool")));
    }

    #[test]
    fn test_explicit_tools_directory_override() {
        let mut fx = Fixture::unix();
        fx.config.set(TOOLS_PATH_KEY, "/configured");
        fx.fs.add_file("/override/tool");

        let strategy = fx.strategy();
        assert_eq!(
            strategy.tools_directory(Some(Path::new("/override"))),
            PathBuf::from("/override")
        );
        let path = strategy
            .resolve(&ToolRegistry::default(), &["tool"], Some(Path::new("/override")))
            .unwrap();
        assert_eq!(path, Some(PathBuf::from("/override/tool")));
    }

    #[test]
    fn test_path_scanned_directory_first() {
        let fx = Fixture::unix();
        fx.env.set_var("PATH", "/a:/b");
        fx.fs.add_file("/a/tool.exe");
        fx.fs.add_file("/b/tool");

        // `/a` is searched for every name before `/b` is considered.
        let path = fx
            .strategy()
            .resolve(&ToolRegistry::default(), &["tool", "tool.exe"], None)
            .unwrap();
        assert_eq!(path, Some(PathBuf::from("/a/tool.exe")));
    }

    #[test]
    fn test_path_entry_errors_are_tolerated() {
        let fx = Fixture::unix();
        fx.env.set_var("PATH", "/broken:/missing:/good");
        fx.fs.fail_directory("/broken");
        fx.fs.add_file("/broken/tool");
        fx.fs.add_file("/good/tool");

        let path = fx
            .strategy()
            .resolve(&ToolRegistry::default(), &["tool"], None)
            .unwrap();
        assert_eq!(path, Some(PathBuf::from("/good/tool")));
    }

    #[test]
    fn test_relative_path_entries_become_absolute() {
        let fx = Fixture::unix();
        fx.env.set_var("PATH", "node_modules/.bin");
        fx.fs.add_file("/work/node_modules/.bin/tool");

        let path = fx
            .strategy()
            .resolve(&ToolRegistry::default(), &["tool"], None)
            .unwrap();
        assert_eq!(path, Some(PathBuf::from("/work/node_modules/.bin/tool")));
    }

    #[test]
    fn test_unix_prefers_native_name_in_registry() {
        let fx = Fixture::unix();
        let registry = ToolRegistry::default();
        registry.register("/pinned/tool.exe").unwrap();
        registry.register("/pinned/tool").unwrap();

        let path = fx
            .strategy()
            .resolve(&registry, &["tool.exe", "tool"], None)
            .unwrap();
        assert_eq!(path, Some(PathBuf::from("/pinned/tool")));
    }

    #[test]
    fn test_windows_prefers_exe_name_in_registry() {
        let fx = Fixture::windows();
        let registry = ToolRegistry::new(NameComparison::CaseInsensitive);
        registry.register(r"C:\pinned\tool").unwrap();
        registry.register(r"C:\pinned\tool.exe").unwrap();

        let path = fx
            .strategy()
            .resolve(&registry, &["tool", "tool.exe"], None)
            .unwrap();
        assert_eq!(path, Some(PathBuf::from(r"C:\pinned\tool.exe")));
    }

    #[test]
    fn test_blank_names_are_rejected() {
        let fx = Fixture::unix();
        let strategy = fx.strategy();
        let registry = ToolRegistry::default();

        for names in [&[][..], &["", "  "][..]] {
            let err = strategy.resolve(&registry, names, None).unwrap_err();
            match err {
                Error::InvalidArgument { parameter, message } => {
                    assert_eq!(parameter, "tool_names");
                    assert_eq!(message, "Tool name cannot be empty.");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_blank_entries_are_skipped() {
        let fx = Fixture::unix();
        fx.fs.add_file("/work/tools/tool");
        let path = fx
            .strategy()
            .resolve(&ToolRegistry::default(), &[" ", "tool"], None)
            .unwrap();
        assert_eq!(path, Some(PathBuf::from("/work/tools/tool")));
    }
}
