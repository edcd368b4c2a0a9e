//! Public entry point for finding tools.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::registry::ToolRegistry;
use super::strategy::{DefaultResolutionStrategy, ResolutionStrategy};
use crate::config::Configuration;
use crate::environment::HostEnvironment;
use crate::fs::FileSystem;
use crate::{Error, Result};

/// Combines a [`ToolRegistry`] with a [`ResolutionStrategy`].
///
/// Tool wrappers depend only on this type. The registry is owned by the
/// build session and passed in explicitly, so two sessions never share
/// registrations.
#[derive(Clone)]
pub struct ToolLocator {
    registry: Arc<ToolRegistry>,
    strategy: Arc<dyn ResolutionStrategy>,
    environment: Arc<dyn HostEnvironment>,
}

impl ToolLocator {
    /// Create a locator from its parts.
    pub fn new(
        registry: Arc<ToolRegistry>,
        strategy: Arc<dyn ResolutionStrategy>,
        environment: Arc<dyn HostEnvironment>,
    ) -> Self {
        Self {
            registry,
            strategy,
            environment,
        }
    }

    /// Create a locator using [`DefaultResolutionStrategy`] and a registry
    /// comparing names the way the environment's platform does.
    pub fn with_defaults(
        fs: Arc<dyn FileSystem>,
        environment: Arc<dyn HostEnvironment>,
        configuration: Arc<dyn Configuration>,
    ) -> Self {
        let registry = Arc::new(ToolRegistry::for_platform(&environment.platform()));
        let strategy = Arc::new(DefaultResolutionStrategy::new(
            fs,
            Arc::clone(&environment),
            configuration,
        ));
        Self::new(registry, strategy, environment)
    }

    /// The registry this locator consults first.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// The environment paths are made absolute against.
    #[must_use]
    pub fn environment(&self) -> &Arc<dyn HostEnvironment> {
        &self.environment
    }

    /// Pin a tool location. Relative paths are resolved against the working
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is empty.
    pub fn register_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument("path", "Path cannot be empty."));
        }
        self.registry.register(self.environment.make_absolute(path))
    }

    /// Resolve a single tool name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `tool` is blank.
    pub fn resolve(&self, tool: &str) -> Result<Option<PathBuf>> {
        if tool.trim().is_empty() {
            return Err(Error::empty_tool_name("tool"));
        }
        self.strategy.resolve(&self.registry, &[tool], None)
    }

    /// Resolve the first of several acceptable names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `tools` is empty or contains a
    /// blank name.
    pub fn resolve_any<S: AsRef<str>>(&self, tools: &[S]) -> Result<Option<PathBuf>> {
        self.resolve_any_in(tools, None)
    }

    /// Like [`resolve_any`](Self::resolve_any) with an explicit tools
    /// directory replacing the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `tools` is empty or contains a
    /// blank name.
    pub fn resolve_any_in<S: AsRef<str>>(
        &self,
        tools: &[S],
        tools_directory: Option<&Path>,
    ) -> Result<Option<PathBuf>> {
        if tools.is_empty() {
            return Err(Error::invalid_argument(
                "tools",
                "At least one tool name is required.",
            ));
        }
        let names: Vec<&str> = tools.iter().map(AsRef::as_ref).collect();
        if names.iter().any(|name| name.trim().is_empty()) {
            return Err(Error::empty_tool_name("tools"));
        }
        self.strategy
            .resolve(&self.registry, &names, tools_directory)
    }
}

impl std::fmt::Debug for ToolLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolLocator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfiguration;
    use crate::testing::{FakeEnvironment, FakeFileSystem};

    fn locator(fs: Arc<FakeFileSystem>, env: Arc<FakeEnvironment>) -> ToolLocator {
        ToolLocator::with_defaults(fs, env, Arc::new(BuildConfiguration::new()))
    }

    #[test]
    fn test_register_file_makes_path_absolute() {
        let env = Arc::new(FakeEnvironment::unix("/work"));
        let locator = locator(Arc::new(FakeFileSystem::new()), env);

        locator.register_file("bin/tool").unwrap();
        assert_eq!(
            locator.resolve("tool").unwrap(),
            Some(PathBuf::from("/work/bin/tool"))
        );
    }

    #[test]
    fn test_register_file_rejects_empty_path() {
        let locator = locator(
            Arc::new(FakeFileSystem::new()),
            Arc::new(FakeEnvironment::unix("/work")),
        );
        assert!(matches!(
            locator.register_file("").unwrap_err(),
            Error::InvalidArgument { parameter: "path", .. }
        ));
    }

    #[test]
    fn test_resolve_rejects_blank_name() {
        let locator = locator(
            Arc::new(FakeFileSystem::new()),
            Arc::new(FakeEnvironment::unix("/work")),
        );
        let err = locator.resolve("   ").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument 'tool': Tool name cannot be empty."
        );
    }

    #[test]
    fn test_resolve_any_validates_collection() {
        let locator = locator(
            Arc::new(FakeFileSystem::new()),
            Arc::new(FakeEnvironment::unix("/work")),
        );
        let empty: [&str; 0] = [];
        assert!(matches!(
            locator.resolve_any(&empty).unwrap_err(),
            Error::InvalidArgument { parameter: "tools", .. }
        ));
        assert!(matches!(
            locator.resolve_any(&["tool", ""]).unwrap_err(),
            Error::InvalidArgument { parameter: "tools", .. }
        ));
    }

    #[test]
    fn test_resolve_any_uses_strategy() {
        let fs = Arc::new(FakeFileSystem::new());
        fs.add_file("/work/tools/nunit3-console");
        let locator = locator(fs, Arc::new(FakeEnvironment::unix("/work")));

        assert_eq!(
            locator
                .resolve_any(&["nunit3-console.exe", "nunit3-console"])
                .unwrap(),
            Some(PathBuf::from("/work/tools/nunit3-console"))
        );
        assert!(locator.resolve("missing").unwrap().is_none());
    }

    #[test]
    fn test_resolve_any_in_overrides_tools_directory() {
        let fs = Arc::new(FakeFileSystem::new());
        fs.add_file("/vendor/tool");
        let locator = locator(fs, Arc::new(FakeEnvironment::unix("/work")));

        assert!(locator.resolve("tool").unwrap().is_none());
        assert_eq!(
            locator
                .resolve_any_in(&["tool"], Some(Path::new("/vendor")))
                .unwrap(),
            Some(PathBuf::from("/vendor/tool"))
        );
    }
}
