//! Mount utilities for container filesystem setup.
//!
//! Each wrapper performs exactly one `mount(2)` or `umount2(2)` call and
//! maps failure onto `MountSetup` with the step name, so a mid-sequence
//! failure in the pivot dance is attributable from the error alone.

use std::path::Path;

use miniruntime_common::error::Result;

/// Remounts `/` with `MS_PRIVATE | MS_REC` so mount events in the new
/// mount namespace never propagate back to the host.
///
/// # Errors
///
/// Returns `MountSetup` if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn make_root_private() -> Result<()> {
    use nix::mount::{mount, MsFlags};

    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_PRIVATE | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| miniruntime_common::error::MiniruntimeError::MountSetup {
        step: "make / private",
        source: e,
    })?;
    tracing::debug!("/ remounted private");
    Ok(())
}

/// Bind-mounts a directory onto itself with `MS_BIND | MS_REC`.
///
/// `pivot_root(2)` requires its new root to be a mount point; a recursive
/// self-bind turns an ordinary directory into one.
///
/// # Errors
///
/// Returns `MountSetup` if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn bind_to_self(path: &Path) -> Result<()> {
    use nix::mount::{mount, MsFlags};

    mount(
        Some(path),
        path,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| miniruntime_common::error::MiniruntimeError::MountSetup {
        step: "bind rootfs to itself",
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "rootfs self-bound");
    Ok(())
}

/// Marks a mount tree `MS_SLAVE | MS_REC`, detaching its propagation from
/// the host.
///
/// # Errors
///
/// Returns `MountSetup` if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn make_slave_recursive(target: &Path) -> Result<()> {
    use nix::mount::{mount, MsFlags};

    mount(
        None::<&str>,
        target,
        None::<&str>,
        MsFlags::MS_SLAVE | MsFlags::MS_REC,
        None::<&str>,
    )
    .map_err(|e| miniruntime_common::error::MiniruntimeError::MountSetup {
        step: "make old root slave",
        source: e,
    })
}

/// Lazily unmounts a mount tree with `MNT_DETACH`.
///
/// # Errors
///
/// Returns `MountSetup` if the `umount2(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn detach(target: &Path) -> Result<()> {
    use nix::mount::{umount2, MntFlags};

    umount2(target, MntFlags::MNT_DETACH).map_err(|e| {
        miniruntime_common::error::MiniruntimeError::MountSetup {
            step: "detach old root",
            source: e,
        }
    })
}

/// Mounts a fresh `proc` instance at `/proc`.
///
/// Must run after the pivot, inside the new PID namespace, so `/proc`
/// reflects the container's processes.
///
/// # Errors
///
/// Returns `MountSetup` if the `mount(2)` syscall fails.
#[cfg(target_os = "linux")]
pub fn mount_proc() -> Result<()> {
    use nix::mount::{mount, MsFlags};

    mount(
        Some("proc"),
        "/proc",
        Some("proc"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| miniruntime_common::error::MiniruntimeError::MountSetup {
        step: "mount /proc",
        source: e,
    })?;
    tracing::debug!("fresh proc mounted");
    Ok(())
}

/// Stubs for non-Linux platforms.
///
/// # Errors
///
/// Every operation returns an error — mount namespaces require Linux.
#[cfg(not(target_os = "linux"))]
mod stubs {
    use super::{Path, Result};
    use miniruntime_common::error::MiniruntimeError;

    fn unsupported(step: &'static str) -> MiniruntimeError {
        MiniruntimeError::MountSetup {
            step,
            source: nix::Error::ENOTSUP,
        }
    }

    pub fn make_root_private() -> Result<()> {
        Err(unsupported("make / private"))
    }

    pub fn bind_to_self(_path: &Path) -> Result<()> {
        Err(unsupported("bind rootfs to itself"))
    }

    pub fn make_slave_recursive(_target: &Path) -> Result<()> {
        Err(unsupported("make old root slave"))
    }

    pub fn detach(_target: &Path) -> Result<()> {
        Err(unsupported("detach old root"))
    }

    pub fn mount_proc() -> Result<()> {
        Err(unsupported("mount /proc"))
    }
}

#[cfg(not(target_os = "linux"))]
pub use stubs::{bind_to_self, detach, make_root_private, make_slave_recursive, mount_proc};
