//! CLI command definitions and dispatch.

pub mod run;
pub mod stop;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// miniruntime — minimal Linux container runtime.
#[derive(Parser, Debug)]
#[command(name = "minirt", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Base directory for per-container state directories.
    #[arg(long, global = true, default_value = miniruntime_common::constants::DEFAULT_RUNTIME_ROOT)]
    pub runtime_root: PathBuf,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a shell inside a new container.
    Run(run::RunArgs),
    /// Stop a running container.
    Stop(stop::StopArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => run::execute(&cli.runtime_root, args),
        Command::Stop(args) => stop::execute(&cli.runtime_root, args),
    }
}
