//! `minirt stop` — Stop a running container.

use std::path::Path;

use clap::Args;
use miniruntime_common::types::ContainerId;

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Identifier of the container to stop.
    pub id: String,
}

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if the container is unknown, not running, or cannot
/// be signaled.
pub fn execute(runtime_root: &Path, args: StopArgs) -> anyhow::Result<()> {
    let id = ContainerId::new(args.id)?;
    tracing::info!(id = %id, "stopping container");
    miniruntime_runtime::container::stop_container(runtime_root, &id)?;
    Ok(())
}
