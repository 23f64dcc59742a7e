//! Root filesystem switching via `pivot_root(2)`.
//!
//! Uses the both-arguments-dot form: after `fchdir` into the new root,
//! `pivot_root(".", ".")` stacks the old root on top of the new one, so no
//! spare `put_old` directory is needed inside the container rootfs. The old
//! root is then unstacked by a recursive-slave remount followed by a lazy
//! unmount.

use std::path::Path;

use miniruntime_common::error::Result;

/// Swaps the calling process onto `rootfs` and mounts a fresh `/proc`.
///
/// Performs the full isolation sequence, in order:
/// 1. Remount `/` private (no propagation back to the host).
/// 2. Bind-mount `rootfs` onto itself (pivot_root needs a mount point).
/// 3. Open `/` and `rootfs` as directory fds, kept across the pivot.
/// 4. `fchdir` into the new root and `pivot_root(".", ".")`.
/// 5. `fchdir` back to the (stacked) old root, then `chdir("/")`.
/// 6. Make the old root a recursive slave and lazily unmount it.
/// 7. Mount `proc` at `/proc`.
///
/// The sequence is not transactional: a mid-sequence failure leaves this
/// process in a half-pivoted mount namespace, which dies with the process.
/// Callers must treat any error as fatal and exit non-zero.
///
/// # Errors
///
/// Returns `MountSetup` for mount-related failures and `PivotFailed` if the
/// `pivot_root(2)` call itself is rejected.
#[cfg(target_os = "linux")]
pub fn switch_root(rootfs: &Path) -> Result<()> {
    use miniruntime_common::error::MiniruntimeError;
    use nix::fcntl::{open, OFlag};
    use nix::sys::stat::Mode;
    use nix::unistd::{chdir, fchdir, pivot_root};

    use super::mount;

    mount::make_root_private()?;
    mount::bind_to_self(rootfs)?;

    // Both fds must stay open across the pivot: oldroot is the only handle
    // back to the stacked old root once "/" means the new root.
    let oldroot = open("/", OFlag::O_DIRECTORY | OFlag::O_RDONLY, Mode::empty()).map_err(|e| {
        MiniruntimeError::MountSetup {
            step: "open old root",
            source: e,
        }
    })?;
    let newroot =
        open(rootfs, OFlag::O_DIRECTORY | OFlag::O_RDONLY, Mode::empty()).map_err(|e| {
            MiniruntimeError::MountSetup {
                step: "open new root",
                source: e,
            }
        })?;

    fchdir(&newroot).map_err(|e| MiniruntimeError::MountSetup {
        step: "enter new root",
        source: e,
    })?;

    tracing::debug!(rootfs = %rootfs.display(), "pivoting root");
    pivot_root(".", ".").map_err(|e| MiniruntimeError::PivotFailed {
        rootfs: rootfs.to_path_buf(),
        source: e,
    })?;

    fchdir(&oldroot).map_err(|e| MiniruntimeError::MountSetup {
        step: "enter stacked old root",
        source: e,
    })?;
    chdir("/").map_err(|e| MiniruntimeError::MountSetup {
        step: "chdir to new root",
        source: e,
    })?;

    mount::make_slave_recursive(Path::new("."))?;
    mount::detach(Path::new("."))?;
    mount::mount_proc()?;

    tracing::debug!("root switch complete");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — `pivot_root` requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn switch_root(rootfs: &Path) -> Result<()> {
    Err(miniruntime_common::error::MiniruntimeError::PivotFailed {
        rootfs: rootfs.to_path_buf(),
        source: nix::Error::ENOTSUP,
    })
}
