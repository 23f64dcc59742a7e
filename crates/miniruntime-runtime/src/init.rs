//! Namespaced init (stage 2).
//!
//! Runs already inside all five fresh namespaces. Performs the root
//! switch, signals readiness on the stage pipe, and replaces itself with
//! the container payload. Between the first mount and the final `proc`
//! mount the namespace is in an intermediate state; every step is fatal
//! and the process must exit non-zero on any failure — the half-pivoted
//! namespace dies with it.

use std::ffi::CString;
use std::path::Path;

use miniruntime_common::constants::{
    CONTAINER_SHELL, DEFAULT_ROOTFS, ROOTFS_PATH_ENV, STAGE_PIPE_ENV,
};
use miniruntime_common::error::{MiniruntimeError, Result};
use miniruntime_core::filesystem;

use crate::handshake;
use crate::pipe;

/// Runs stage 2: isolate the filesystem, signal readiness, exec the shell.
///
/// Tolerates an absent `STAGE_PIPE` (the readiness signal is skipped), so
/// the stage can be exercised standalone.
///
/// # Errors
///
/// Returns `MountSetup`/`PivotFailed` from the root switch, `Handshake` if
/// the readiness byte cannot be delivered, and `ExecFailed` if the payload
/// cannot be executed. On success this function never returns.
pub fn child_stage() -> Result<()> {
    let stage_pipe = match std::env::var(STAGE_PIPE_ENV) {
        Ok(value) => Some(pipe::stream_from_fd_str(STAGE_PIPE_ENV, &value)?),
        Err(_) => None,
    };

    let rootfs = std::env::var(ROOTFS_PATH_ENV)
        .ok()
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| DEFAULT_ROOTFS.to_string());

    tracing::debug!(rootfs = %rootfs, "switching onto container rootfs");
    filesystem::switch_root(Path::new(&rootfs))?;

    // Everything that can fail before exec has succeeded; release the
    // parent stage.
    if let Some(pipe) = stage_pipe {
        handshake::send_ready(&mut (&pipe))?;
    }

    let shell = CString::new(CONTAINER_SHELL).map_err(|_| MiniruntimeError::ExecFailed {
        path: CONTAINER_SHELL.into(),
        source: nix::Error::EINVAL,
    })?;
    let argv = [shell.clone()];

    tracing::debug!(payload = CONTAINER_SHELL, "handing control to the container payload");
    // execv inherits the current environment and only returns on failure.
    match nix::unistd::execv(&shell, &argv) {
        Err(errno) => Err(MiniruntimeError::ExecFailed {
            path: CONTAINER_SHELL.into(),
            source: errno,
        }),
        Ok(infallible) => match infallible {},
    }
}
