//! Subcommand implementations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use toolrun_core::arguments::ProcessArgumentBuilder;
use toolrun_core::command::{CommandRunner, CommandSettings};
use toolrun_core::config::{BuildConfiguration, TOOLS_PATH_KEY};
use toolrun_core::environment::{HostEnvironment, SystemEnvironment};
use toolrun_core::fs::LocalFileSystem;
use toolrun_core::invocation::{ToolRunner, ToolSettings};
use toolrun_core::process::{TokioProcessRunner, ToolProcess};
use toolrun_core::tools::ToolLocator;
use toolrun_core::{Error, Result};

use crate::cli::Commands;

/// Run one parsed subcommand.
pub async fn execute(command: Commands, tools_dir: Option<PathBuf>) -> Result<ExitCode> {
    let locator = build_locator(tools_dir.as_deref())?;
    match command {
        Commands::Which { names } => which(&locator, &names),
        Commands::Run {
            names,
            name,
            tool_path,
            working_dir,
            timeout,
            env,
            capture,
            args,
        } => {
            let mut tool = ToolSettings::new();
            tool.tool_path = tool_path;
            tool.working_directory = working_dir;
            tool.timeout = timeout.map(Duration::from_secs);
            tool.environment_variables.extend(env);

            let mut settings = CommandSettings::new(names).with_tool_settings(tool);
            settings.tool_name = name;
            let runner = CommandRunner::new(ToolRunner::new(
                locator,
                Arc::new(TokioProcessRunner::new()),
            ));
            let console = capture.then(Console::system);
            run(&runner, settings, args, console).await
        }
    }
}

fn build_locator(tools_dir: Option<&Path>) -> Result<ToolLocator> {
    let environment = Arc::new(SystemEnvironment::new());
    let mut configuration = BuildConfiguration::load(&environment.working_directory())?;
    if let Some(dir) = tools_dir {
        configuration.set(TOOLS_PATH_KEY, dir.display().to_string());
    }
    Ok(ToolLocator::with_defaults(
        Arc::new(LocalFileSystem),
        environment,
        Arc::new(configuration),
    ))
}

fn which(locator: &ToolLocator, names: &[String]) -> Result<ExitCode> {
    match locator.resolve_any(names)? {
        Some(path) => {
            write_lines(&mut io::stdout().lock(), &[path.display().to_string()])?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            tracing::debug!(tools = ?names, "No executable found");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Destination of output captured with `--capture`.
#[derive(Clone)]
struct Console {
    stdout: Arc<Mutex<dyn Write + Send>>,
    stderr: Arc<Mutex<dyn Write + Send>>,
}

impl Console {
    fn system() -> Self {
        Self {
            stdout: Arc::new(Mutex::new(io::stdout())),
            stderr: Arc::new(Mutex::new(io::stderr())),
        }
    }

    fn forward(&self, process: &dyn ToolProcess) {
        let result = write_lines(
            &mut *self.stdout.lock().unwrap_or_else(PoisonError::into_inner),
            process.standard_output(),
        )
        .and_then(|()| {
            write_lines(
                &mut *self.stderr.lock().unwrap_or_else(PoisonError::into_inner),
                process.standard_error(),
            )
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to forward tool output");
        }
    }
}

/// Run the tool with inherited streams, or with `console` capturing its
/// output. Captured output is forwarded before the exit code is checked, so
/// a failing tool still shows what it printed.
async fn run(
    runner: &CommandRunner,
    mut settings: CommandSettings,
    args: Vec<String>,
    console: Option<Console>,
) -> Result<ExitCode> {
    let mut arguments = ProcessArgumentBuilder::new();
    for arg in args {
        arguments.append(arg);
    }

    match console {
        Some(console) => {
            settings.tool = settings
                .tool
                .with_post_action(move |process| console.forward(process));
            runner.run_with_output(&settings, arguments).await?;
        }
        None => {
            runner.run(&settings, arguments).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn write_lines(out: &mut dyn Write, lines: &[String]) -> Result<()> {
    for line in lines {
        writeln!(out, "{line}").map_err(|e| Error::io(e, None, "write output"))?;
    }
    out.flush().map_err(|e| Error::io(e, None, "write output"))
}

/// Exit code reported for a failed command.
///
/// Tool failures pass the tool's own code through when it fits in a
/// process exit status.
pub fn failure_code(error: &Error) -> ExitCode {
    error
        .process_exit_code()
        .and_then(|code| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .map_or(ExitCode::FAILURE, ExitCode::from)
}
