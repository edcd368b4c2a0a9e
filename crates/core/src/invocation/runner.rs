//! Runs a described tool as an external process.

use std::path::PathBuf;
use std::sync::Arc;

use super::descriptor::ToolDescriptor;
use super::settings::ToolSettings;
use super::{InvocationState, ToolOutcome};
use crate::arguments::ProcessArgumentBuilder;
use crate::process::{ProcessRunner, ProcessSettings};
use crate::tools::ToolLocator;
use crate::{Error, Result};

/// Resolves, launches and checks tool processes.
#[derive(Clone)]
pub struct ToolRunner {
    locator: ToolLocator,
    process_runner: Arc<dyn ProcessRunner>,
}

impl ToolRunner {
    /// Create a runner.
    pub fn new(locator: ToolLocator, process_runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            locator,
            process_runner,
        }
    }

    /// The locator used for tools without an explicit path.
    #[must_use]
    pub fn locator(&self) -> &ToolLocator {
        &self.locator
    }

    /// Run `tool`, letting its output go to the inherited streams.
    ///
    /// # Errors
    ///
    /// Fails if the tool cannot be found or started, times out, or exits
    /// with a code the exit-code policy rejects.
    pub async fn run(
        &self,
        tool: &ToolDescriptor,
        settings: &ToolSettings,
        arguments: ProcessArgumentBuilder,
    ) -> Result<ToolOutcome> {
        self.execute(tool, settings, arguments, false).await
    }

    /// Run `tool` and capture its standard output and error.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub async fn run_with_output(
        &self,
        tool: &ToolDescriptor,
        settings: &ToolSettings,
        arguments: ProcessArgumentBuilder,
    ) -> Result<ToolOutcome> {
        self.execute(tool, settings, arguments, true).await
    }

    /// The executable `tool` would run with `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] if nothing resolves.
    pub fn resolve_tool_path(&self, tool: &ToolDescriptor, settings: &ToolSettings) -> Result<PathBuf> {
        tool.validate()?;
        if let Some(path) = &settings.tool_path {
            return Ok(self.locator.environment().make_absolute(path));
        }
        self.locator
            .resolve_any(tool.executable_names())?
            .ok_or_else(|| Error::tool_not_found(tool.name()))
    }

    /// Launch settings for one run of `tool`.
    #[must_use]
    pub fn process_settings(
        &self,
        tool: &ToolDescriptor,
        settings: &ToolSettings,
        arguments: ProcessArgumentBuilder,
        capture_output: bool,
    ) -> ProcessSettings {
        let environment = self.locator.environment();
        let working_directory = if settings.no_working_directory {
            None
        } else {
            let dir = settings
                .working_directory
                .clone()
                .or_else(|| tool.working_directory().cloned())
                .unwrap_or_else(|| environment.working_directory());
            Some(environment.make_absolute(&dir))
        };

        let mut process_settings = ProcessSettings {
            arguments: settings.customize_arguments(arguments),
            working_directory,
            environment_variables: settings.environment_variables.clone(),
            redirect_standard_output: capture_output,
            redirect_standard_error: capture_output,
            silent: false,
        };
        if let Some(setup) = &settings.setup_process_settings {
            setup(&mut process_settings);
        }
        process_settings
    }

    async fn execute(
        &self,
        tool: &ToolDescriptor,
        settings: &ToolSettings,
        arguments: ProcessArgumentBuilder,
        capture_output: bool,
    ) -> Result<ToolOutcome> {
        let name = tool.name();
        transition(name, InvocationState::Resolving);
        let program = self
            .resolve_tool_path(tool, settings)
            .inspect_err(|e| fail(name, e))?;

        let process_settings = self.process_settings(tool, settings, arguments, capture_output);
        let args = process_settings
            .arguments
            .to_args()
            .inspect_err(|e| fail(name, e))?;
        let mut process = self
            .process_runner
            .start(&program, &args, &process_settings)
            .await
            .map_err(|e| Error::process_not_started(name, e))
            .inspect_err(|e| fail(name, e))?;
        transition(name, InvocationState::Launched);

        let exited = process
            .wait_for_exit(settings.timeout)
            .await
            .inspect_err(|e| fail(name, e))?;
        if !exited {
            let timeout = settings.timeout.unwrap_or_default();
            if let Err(e) = process.kill().await {
                tracing::warn!(tool = %name, error = %e, "Failed to kill timed out process");
            }
            let error = Error::timeout(name, timeout);
            fail(name, &error);
            return Err(error);
        }
        transition(name, InvocationState::Exited);
        if let Some(action) = &settings.post_action {
            action(&*process);
        }

        let exit_code = process.exit_code().unwrap_or(-1);
        let accepted = match settings
            .handle_exit_code
            .as_ref()
            .or_else(|| tool.exit_code_predicate())
        {
            Some(handler) => handler(exit_code),
            None => exit_code == 0,
        };
        if !accepted {
            let error = tool.exit_code_error(exit_code);
            fail(name, &error);
            return Err(error);
        }
        transition(name, InvocationState::Succeeded);

        Ok(ToolOutcome {
            exit_code,
            standard_output: process.standard_output().to_vec(),
            standard_error: process.standard_error().to_vec(),
        })
    }
}

impl std::fmt::Debug for ToolRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRunner")
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

fn transition(tool: &str, state: InvocationState) {
    tracing::debug!(tool = %tool, %state, "Tool invocation state");
}

fn fail(tool: &str, error: &Error) {
    tracing::warn!(tool = %tool, state = %InvocationState::Failed, %error, "Tool invocation failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfiguration;
    use crate::process::ToolProcess;
    use crate::testing::{FakeEnvironment, FakeFileSystem, FakeProcessBehavior, FakeProcessRunner};
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::time::Duration;

    struct Fixture {
        fs: Arc<FakeFileSystem>,
        processes: Arc<FakeProcessRunner>,
        runner: ToolRunner,
    }

    fn fixture(processes: FakeProcessRunner) -> Fixture {
        let fs = Arc::new(FakeFileSystem::new());
        let environment = Arc::new(FakeEnvironment::unix("/work"));
        environment.set_var("PATH", "/usr/bin");
        let locator = ToolLocator::with_defaults(
            fs.clone(),
            environment,
            Arc::new(BuildConfiguration::new()),
        );
        let processes = Arc::new(processes);
        let runner = ToolRunner::new(locator, processes.clone());
        Fixture {
            fs,
            processes,
            runner,
        }
    }

    fn tool() -> ToolDescriptor {
        ToolDescriptor::new("Runner", ["runner", "runner.exe"])
    }

    fn args(values: &[&str]) -> ProcessArgumentBuilder {
        let mut args = ProcessArgumentBuilder::new();
        for value in values {
            args.append(*value);
        }
        args
    }

    #[tokio::test]
    async fn test_runs_resolved_tool() {
        let f = fixture(FakeProcessRunner::new());
        f.fs.add_file("/usr/bin/runner");

        let outcome = f
            .runner
            .run(&tool(), &ToolSettings::new(), args(&["build"]))
            .await
            .unwrap();

        assert_eq!(outcome.exit_code, 0);
        let launch = f.processes.last_launch().unwrap();
        assert_eq!(launch.program, Path::new("/usr/bin/runner"));
        assert_eq!(launch.settings.arguments.render(), "build");
        assert_eq!(launch.settings.working_directory.as_deref(), Some(Path::new("/work")));
        assert!(!launch.settings.redirect_standard_output);
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported_by_name() {
        let f = fixture(FakeProcessRunner::new());

        let err = f
            .runner
            .run(&tool(), &ToolSettings::new(), args(&[]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Runner: Could not locate executable.");
        assert!(f.processes.launches().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_tool_path_skips_resolution() {
        let f = fixture(FakeProcessRunner::new());
        let settings = ToolSettings::new().with_tool_path("bin/custom-runner");

        f.runner.run(&tool(), &settings, args(&[])).await.unwrap();

        let launch = f.processes.last_launch().unwrap();
        assert_eq!(launch.program, Path::new("/work/bin/custom-runner"));
    }

    #[tokio::test]
    async fn test_registered_tool_wins() {
        let f = fixture(FakeProcessRunner::new());
        f.fs.add_file("/usr/bin/runner");
        f.runner
            .locator()
            .register_file("/opt/pinned/runner")
            .unwrap();

        f.runner
            .run(&tool(), &ToolSettings::new(), args(&[]))
            .await
            .unwrap();

        assert_eq!(
            f.processes.last_launch().unwrap().program,
            Path::new("/opt/pinned/runner")
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_by_default() {
        let f = fixture(FakeProcessRunner::exiting_with(3));
        f.fs.add_file("/usr/bin/runner");

        let err = f
            .runner
            .run(&tool(), &ToolSettings::new(), args(&[]))
            .await
            .unwrap_err();

        assert_eq!(err.process_exit_code(), Some(3));
        assert_eq!(
            err.to_string(),
            "Runner: Process returned an error (exit code 3)."
        );
    }

    #[tokio::test]
    async fn test_exit_code_handler_accepts_code() {
        let f = fixture(FakeProcessRunner::exiting_with(1));
        f.fs.add_file("/usr/bin/runner");
        let settings = ToolSettings::new().with_exit_code_handler(|code| code <= 1);

        let outcome = f.runner.run(&tool(), &settings, args(&[])).await.unwrap();
        assert_eq!(outcome.exit_code, 1);
    }

    #[tokio::test]
    async fn test_exit_code_handler_overrides_tool_predicate() {
        let f = fixture(FakeProcessRunner::exiting_with(0));
        f.fs.add_file("/usr/bin/runner");
        let tool = tool().with_exit_code_predicate(|code| code == 0);
        let settings = ToolSettings::new().with_exit_code_handler(|code| code == 2);

        let err = f.runner.run(&tool, &settings, args(&[])).await.unwrap_err();
        assert_eq!(err.process_exit_code(), Some(0));
    }

    #[tokio::test]
    async fn test_tool_predicate_and_messages() {
        let f = fixture(FakeProcessRunner::exiting_with(-2));
        f.fs.add_file("/usr/bin/runner");
        let tool = tool()
            .with_exit_code_predicate(|code| code >= 0)
            .with_exit_code_messages(|code| (code == -2).then(|| "Invalid assembly".to_string()));

        let err = f
            .runner
            .run(&tool, &ToolSettings::new(), args(&[]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Runner: Invalid assembly");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let f = fixture(FakeProcessRunner::with_behavior(FakeProcessBehavior {
            hang: true,
            ..FakeProcessBehavior::default()
        }));
        f.fs.add_file("/usr/bin/runner");
        let settings = ToolSettings::new().with_timeout(Duration::from_millis(50));

        let err = f.runner.run(&tool(), &settings, args(&[])).await.unwrap_err();

        assert!(matches!(err, Error::Timeout { .. }));
        assert!(f.processes.was_killed());
    }

    #[tokio::test]
    async fn test_start_failure_is_process_not_started() {
        let f = fixture(FakeProcessRunner::with_behavior(FakeProcessBehavior {
            fail_to_start: true,
            ..FakeProcessBehavior::default()
        }));
        f.fs.add_file("/usr/bin/runner");

        let err = f
            .runner
            .run(&tool(), &ToolSettings::new(), args(&[]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Runner: Process was not started.");
    }

    #[tokio::test]
    async fn test_argument_customization_replaces_arguments() {
        let f = fixture(FakeProcessRunner::new());
        f.fs.add_file("/usr/bin/runner");
        let settings = ToolSettings::new().with_argument_customization(|_args| "--only this");

        f.runner
            .run(&tool(), &settings, args(&["dropped"]))
            .await
            .unwrap();

        let launch = f.processes.last_launch().unwrap();
        assert_eq!(launch.settings.arguments.render(), "--only this");
    }

    #[tokio::test]
    async fn test_working_directory_precedence() {
        let f = fixture(FakeProcessRunner::new());
        f.fs.add_file("/usr/bin/runner");
        let tool = tool().with_working_directory("/tool/default");

        f.runner
            .run(&tool, &ToolSettings::new(), args(&[]))
            .await
            .unwrap();
        assert_eq!(
            f.processes.last_launch().unwrap().settings.working_directory,
            Some("/tool/default".into())
        );

        let settings = ToolSettings::new().with_working_directory("src");
        f.runner.run(&tool, &settings, args(&[])).await.unwrap();
        assert_eq!(
            f.processes.last_launch().unwrap().settings.working_directory,
            Some("/work/src".into())
        );

        let settings = ToolSettings::new()
            .with_working_directory("src")
            .without_working_directory();
        f.runner.run(&tool, &settings, args(&[])).await.unwrap();
        assert_eq!(
            f.processes.last_launch().unwrap().settings.working_directory,
            None
        );
    }

    #[tokio::test]
    async fn test_environment_and_setup_hook() {
        let f = fixture(FakeProcessRunner::new());
        f.fs.add_file("/usr/bin/runner");
        let settings = ToolSettings::new()
            .with_environment_variable("RUNNER_MODE", "ci")
            .with_process_settings_setup(|process| process.silent = true);

        f.runner.run(&tool(), &settings, args(&[])).await.unwrap();

        let launch = f.processes.last_launch().unwrap();
        assert_eq!(
            launch.settings.environment_variables.get("RUNNER_MODE").map(String::as_str),
            Some("ci")
        );
        assert!(launch.settings.silent);
    }

    #[tokio::test]
    async fn test_run_with_output_captures_lines() {
        let f = fixture(FakeProcessRunner::with_behavior(FakeProcessBehavior {
            standard_output: vec!["1.2.3".into(), "done".into()],
            standard_error: vec!["warning".into()],
            ..FakeProcessBehavior::default()
        }));
        f.fs.add_file("/usr/bin/runner");

        let outcome = f
            .runner
            .run_with_output(&tool(), &ToolSettings::new(), args(&["--version"]))
            .await
            .unwrap();

        assert_eq!(outcome.stdout(), "1.2.3\ndone");
        assert_eq!(outcome.stderr(), "warning");
        assert!(f.processes.last_launch().unwrap().settings.redirect_standard_output);
    }

    #[tokio::test]
    async fn test_post_action_sees_exit_code() {
        let f = fixture(FakeProcessRunner::exiting_with(0));
        f.fs.add_file("/usr/bin/runner");
        let seen = Arc::new(AtomicI32::new(-99));
        let seen_in_action = Arc::clone(&seen);
        let settings = ToolSettings::new().with_post_action(move |process: &dyn ToolProcess| {
            seen_in_action.store(process.exit_code().unwrap_or(-1), Ordering::SeqCst);
        });

        f.runner.run(&tool(), &settings, args(&[])).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_post_action_runs_before_exit_code_check() {
        let f = fixture(FakeProcessRunner::with_behavior(FakeProcessBehavior {
            exit_code: 1,
            standard_error: vec!["error CS1002: ; expected".into()],
            ..FakeProcessBehavior::default()
        }));
        f.fs.add_file("/usr/bin/runner");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_action = Arc::clone(&seen);
        let settings = ToolSettings::new().with_post_action(move |process: &dyn ToolProcess| {
            seen_in_action.lock().unwrap().push((
                process.exit_code(),
                process.standard_error().to_vec(),
            ));
        });

        let err = f
            .runner
            .run_with_output(&tool(), &settings, args(&[]))
            .await
            .unwrap_err();

        assert_eq!(err.process_exit_code(), Some(1));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(Some(1), vec!["error CS1002: ; expected".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_post_action_skipped_on_timeout() {
        let f = fixture(FakeProcessRunner::with_behavior(FakeProcessBehavior {
            hang: true,
            ..FakeProcessBehavior::default()
        }));
        f.fs.add_file("/usr/bin/runner");
        let calls = Arc::new(AtomicI32::new(0));
        let calls_in_action = Arc::clone(&calls);
        let settings = ToolSettings::new()
            .with_timeout(Duration::from_millis(20))
            .with_post_action(move |_: &dyn ToolProcess| {
                calls_in_action.fetch_add(1, Ordering::SeqCst);
            });

        let err = f.runner.run(&tool(), &settings, args(&[])).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unbalanced_raw_arguments_are_rejected_before_launch() {
        let f = fixture(FakeProcessRunner::new());
        f.fs.add_file("/usr/bin/runner");
        let settings = ToolSettings::new().with_argument_customization(|_args| "-c \"echo");

        let err = f.runner.run(&tool(), &settings, args(&[])).await.unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidArgument {
                parameter: "arguments",
                ..
            }
        ));
        assert!(f.processes.launches().is_empty());
    }

    #[tokio::test]
    async fn test_launch_receives_split_arguments() {
        let f = fixture(FakeProcessRunner::new());
        f.fs.add_file("/usr/bin/runner");
        let settings =
            ToolSettings::new().with_argument_customization(|_args| "--filter 'My Tests' -v");

        f.runner.run(&tool(), &settings, args(&[])).await.unwrap();

        assert_eq!(
            f.processes.last_launch().unwrap().args,
            ["--filter", "My Tests", "-v"]
        );
    }

    #[tokio::test]
    async fn test_invalid_descriptor_is_rejected() {
        let f = fixture(FakeProcessRunner::new());
        let tool = ToolDescriptor::new("", ["runner"]);

        let err = f
            .runner
            .run(&tool, &ToolSettings::new(), args(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
