//! # minirt — miniruntime CLI
//!
//! Minimal Linux container runtime. Runs a shell inside fresh kernel
//! namespaces on a pivoted root filesystem, records container state on
//! disk, and stops detached containers by identifier.
//!
//! The same binary implements all three process stages; re-executed stage
//! invocations are recognized and dispatched before the command-line layer
//! ever runs.

#![allow(clippy::print_stderr)]

mod commands;
mod stage;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Reserved re-exec entry points; must be consumed before clap sees
    // the argument vector.
    stage::dispatch_reexec();

    let cli = Cli::parse();
    commands::execute(cli)
}
