use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "toolrun")]
#[command(about = "Locate and run build tools")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: crate::tracing::LogLevel,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Directory searched before PATH")]
    pub tools_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Print the executable a tool name resolves to")]
    Which {
        #[arg(required = true, help = "Acceptable executable names, preferred first")]
        names: Vec<String>,
    },
    #[command(about = "Resolve a tool and run it")]
    Run {
        #[arg(required = true, help = "Acceptable executable names, preferred first")]
        names: Vec<String>,
        #[arg(long, help = "Display name used in errors")]
        name: Option<String>,
        #[arg(long, help = "Run this executable instead of resolving one")]
        tool_path: Option<PathBuf>,
        #[arg(long, help = "Working directory for the tool")]
        working_dir: Option<PathBuf>,
        #[arg(long, help = "Kill the tool after this many seconds")]
        timeout: Option<u64>,
        #[arg(
            long = "env",
            value_name = "KEY=VALUE",
            value_parser = parse_env_pair,
            help = "Set an environment variable for the tool"
        )]
        env: Vec<(String, String)>,
        #[arg(
            long,
            help = "Buffer the tool's output and print it once the tool exits, even on failure"
        )]
        capture: bool,
        #[arg(last = true, help = "Arguments passed to the tool")]
        args: Vec<String>,
    },
}

fn parse_env_pair(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{value}'")),
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
