//! `minirt run` — Launch a shell inside a new container.

use std::path::Path;

use clap::Args;
use miniruntime_common::types::ContainerId;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Container identifier; also names the state directory.
    pub id: String,

    /// Path to the OCI runtime config.
    #[arg(short = 'c', long = "config", default_value = miniruntime_common::constants::DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Detach once the container init is confirmed running.
    #[arg(short, long)]
    pub detach: bool,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if the container cannot be launched.
pub fn execute(runtime_root: &Path, args: RunArgs) -> anyhow::Result<()> {
    let id = ContainerId::new(args.id)?;
    tracing::info!(id = %id, config = %args.config, detach = args.detach, "running container");
    miniruntime_runtime::container::run_container(
        runtime_root,
        &id,
        Path::new(&args.config),
        args.detach,
    )?;
    Ok(())
}
