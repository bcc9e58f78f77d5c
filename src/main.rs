// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Spec { args } => commands::cmd_spec(args),
        Commands::Build { args, sign } => commands::cmd_build(args, sign),
        Commands::Plan { args, format } => commands::cmd_plan(args, format),
        Commands::Version { version, release } => {
            commands::cmd_version(&version, release.as_deref())
        }
        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
