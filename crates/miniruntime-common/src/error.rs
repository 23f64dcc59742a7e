//! Unified error types for the miniruntime workspace.
//!
//! Every fallible operation across the stages maps onto one of these
//! variants; stages 1 and 2 print the error to stderr and exit non-zero,
//! stage 0 returns it to the CLI layer.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum MiniruntimeError {
    /// A caller-supplied value is invalid.
    #[error("invalid input: {message}")]
    BadInput {
        /// Description of the invalid value.
        message: String,
    },

    /// The runtime-spec configuration could not be read or parsed.
    #[error("cannot load runtime spec {}: {reason}", .path.display())]
    SpecLoad {
        /// Path of the config document.
        path: PathBuf,
        /// What went wrong while opening or decoding it.
        reason: String,
    },

    /// The source rootfs tree exists at neither candidate location.
    #[error("source rootfs not found at {} or {}", .primary.display(), .fallback.display())]
    RootfsMissing {
        /// Fixed primary lookup path.
        primary: PathBuf,
        /// CWD-relative fallback path.
        fallback: PathBuf,
    },

    /// The on-disk container state could not be written.
    #[error("cannot write state at {}", .path.display())]
    StateWrite {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The on-disk container state could not be read or decoded.
    #[error("cannot read state at {}: {reason}", .path.display())]
    StateRead {
        /// Path being read.
        path: PathBuf,
        /// What went wrong while opening or decoding it.
        reason: String,
    },

    /// A child process could not be started.
    #[error("failed to spawn {what}")]
    Spawn {
        /// Which process or resource failed to come up.
        what: &'static str,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The inter-stage startup protocol was violated.
    #[error("stage handshake failed: {reason}")]
    Handshake {
        /// Protocol deviation observed.
        reason: String,
    },

    /// A mount operation in the isolation sequence failed.
    #[error("mount setup failed ({step})")]
    MountSetup {
        /// Which step of the sequence failed.
        step: &'static str,
        /// Errno returned by the kernel.
        source: nix::Error,
    },

    /// The `pivot_root(2)` call itself failed.
    #[error("pivot_root into {} failed", .rootfs.display())]
    PivotFailed {
        /// The new root that was being pivoted into.
        rootfs: PathBuf,
        /// Errno returned by the kernel.
        source: nix::Error,
    },

    /// Replacing the process image with the container payload failed.
    #[error("exec of {} failed", .path.display())]
    ExecFailed {
        /// Payload binary that failed to exec.
        path: PathBuf,
        /// Errno returned by the kernel.
        source: nix::Error,
    },

    /// Delivering a signal to the container init process failed.
    #[error("failed to signal pid {pid}")]
    Signal {
        /// Target process id.
        pid: i32,
        /// Errno returned by the kernel.
        source: nix::Error,
    },

    /// No state exists for the requested container id.
    #[error("container not found: {id}")]
    NotFound {
        /// Identifier that was looked up.
        id: String,
    },

    /// The container exists but is not in the `Running` state.
    #[error("container {id} is not running")]
    NotRunning {
        /// Identifier of the container.
        id: String,
    },

    /// Waiting on a child process failed or it exited abnormally.
    #[error("child process failed: {reason}")]
    ChildWait {
        /// Exit status or wait error.
        reason: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MiniruntimeError>;
