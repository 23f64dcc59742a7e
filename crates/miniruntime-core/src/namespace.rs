//! Linux namespace creation for the container init process.
//!
//! The init process must start life inside five fresh namespaces: PID,
//! mount, network, UTS, and cgroup. All five are applied atomically at
//! `clone(2)` time, which also makes the cloned child PID 1 of the new PID
//! namespace. (An `unshare(2)`-based variant would not work here: after
//! `unshare(CLONE_NEWPID)` the kernel refuses both thread creation in the
//! parent and PID-namespace entry for the exec'd child itself.)

#[cfg(target_os = "linux")]
use miniruntime_common::error::Result;

/// Clones the namespaced init process.
///
/// The callback runs in the child, inside all five new namespaces, as
/// PID 1 of the fresh PID namespace; its return value becomes the child's
/// exit status. The child is delivered to the parent as a regular
/// `SIGCHLD` child, so `waitpid(2)` applies.
///
/// # Safety
///
/// The child runs on a copy-on-write image of the parent (no `CLONE_VM`),
/// but between clone and exec it is still subject to post-fork rules: the
/// callback must confine itself to dup/setsid/exec-style operations.
///
/// # Errors
///
/// Returns `Spawn` if the `clone(2)` syscall fails.
#[cfg(target_os = "linux")]
pub unsafe fn spawn_namespaced(
    callback: nix::sched::CloneCb<'_>,
    stack: &mut [u8],
) -> Result<nix::unistd::Pid> {
    use miniruntime_common::error::MiniruntimeError;
    use nix::sched::{clone, CloneFlags};
    use nix::sys::signal::Signal;

    let flags = CloneFlags::CLONE_NEWUTS
        | CloneFlags::CLONE_NEWPID
        | CloneFlags::CLONE_NEWNET
        | CloneFlags::CLONE_NEWNS
        | CloneFlags::CLONE_NEWCGROUP;

    let pid = clone(callback, stack, flags, Some(Signal::SIGCHLD as i32)).map_err(|e| {
        MiniruntimeError::Spawn {
            what: "namespaced init",
            source: std::io::Error::from_raw_os_error(e as i32),
        }
    })?;
    tracing::debug!(pid = pid.as_raw(), "namespaced init cloned");
    Ok(pid)
}
