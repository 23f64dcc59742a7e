//! Re-exec stage dispatch.
//!
//! `minirt init PARENT_STAGE` and `minirt init CHILD_STAGE` are reserved
//! argument prefixes produced when the runtime re-invokes its own binary
//! through `/proc/self/exe`. They must never reach the user-facing command
//! layer, so recognition happens in this preamble before clap parses
//! anything.

use std::process;

use miniruntime_common::constants::{CHILD_STAGE, INIT_COMMAND, PARENT_STAGE};

/// Recognizes and runs a re-executed stage. Never returns if one matched:
/// the stage result becomes the process exit status, with the error
/// printed to stderr.
pub fn dispatch_reexec() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 || args[1] != INIT_COMMAND {
        return;
    }

    let result = if args[2] == PARENT_STAGE {
        miniruntime_runtime::process::parent_stage()
    } else if args[2] == CHILD_STAGE {
        miniruntime_runtime::init::child_stage()
    } else {
        return;
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("minirt {}: {:#}", args[2], anyhow::Error::from(e));
            process::exit(1);
        }
    }
}
