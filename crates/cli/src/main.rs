//! `toolrun`: locate and run build tools.

mod cli;
mod commands;
mod tracing;

use std::process::ExitCode;

use crate::tracing::TracingConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    let tracing_config = TracingConfig {
        level: cli.level.into(),
        json: cli.json,
        ..Default::default()
    };
    if let Err(error) = crate::tracing::init_tracing(tracing_config) {
        eprintln!("{error:?}");
        return ExitCode::FAILURE;
    }

    match commands::execute(cli.command, cli.tools_dir).await {
        Ok(code) => code,
        Err(error) => {
            let code = commands::failure_code(&error);
            eprintln!("{:?}", miette::Report::new(error));
            code
        }
    }
}
