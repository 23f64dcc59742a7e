//! Parent-stage driver (stage 1).
//!
//! The runtime re-executes its own binary as `init PARENT_STAGE`. This
//! process has exactly one job: clone the namespaced init into its fresh
//! namespaces, confirm it came up, and relay its PID back to the runtime.
//! It exits 0 on success; any fatal error is printed by the stage preamble
//! and exits 1.

use miniruntime_common::error::Result;

/// Stack for the cloned init. The child only dups descriptors and execs,
/// so it needs very little.
#[cfg(target_os = "linux")]
const INIT_STACK_SIZE: usize = 1024 * 1024;

/// Runs stage 1: clone the namespaced init and relay its PID upward.
///
/// # Errors
///
/// Returns `Handshake` for any protocol deviation on either pipe, `Spawn`
/// if the child stage cannot be started, and `ChildWait` if attached-mode
/// waiting reports a failure.
#[cfg(target_os = "linux")]
pub fn parent_stage() -> Result<()> {
    use std::fs::File;
    use std::io::{self, BufReader};
    use std::os::fd::AsRawFd;

    use miniruntime_common::constants::{DEFAULT_ROOTFS, INIT_PIPE_ENV};
    use miniruntime_common::error::MiniruntimeError;
    use miniruntime_core::namespace;

    use crate::handshake;
    use crate::pipe;

    let init_pipe = pipe::inherited_stream(INIT_PIPE_ENV)?;
    // The init pipe had to be inheritable to survive our own exec; re-arm
    // close-on-exec so it cannot leak into the container payload.
    pipe::set_cloexec(&init_pipe)?;

    let options = {
        let mut reader = BufReader::new(&init_pipe);
        handshake::recv_options(&mut reader)?
    };
    tracing::debug!(detach = options.detach, rootfs = %options.rootfs, "stage options received");

    // Handshake part A: tell the runtime the parent stage is alive.
    handshake::send_ready(&mut (&init_pipe))?;

    let (stage_parent, stage_child) = pipe::stage_socket_pair()?;

    let rootfs = if options.rootfs.is_empty() {
        DEFAULT_ROOTFS.to_string()
    } else {
        options.rootfs.clone()
    };
    let detach = options.detach;

    // The child-stage image is assembled up front; between clone and exec
    // the callback may only dup, setsid, and exec.
    let argv = image::child_stage_argv()?;
    let envp = image::child_stage_env(stage_child.as_raw_fd(), &rootfs)?;

    let mut stdin_writer = None;
    let mut detach_stdio = None;
    if detach {
        // The init must not hold the controlling terminal; whatever is
        // piped into our stdin is bridged through an ordinary pipe so the
        // container can still read its script after we exit.
        let (reader, writer) = pipe::stdin_bridge_pipe()?;
        let null = File::options()
            .read(true)
            .write(true)
            .open("/dev/null")
            .map_err(|e| MiniruntimeError::Spawn {
                what: "/dev/null",
                source: e,
            })?;
        stdin_writer = Some(writer);
        detach_stdio = Some((reader, null));
    }

    tracing::debug!(rootfs = %rootfs, detach, "cloning child stage into new namespaces");
    let mut stack = vec![0u8; INIT_STACK_SIZE];
    let callback = Box::new(|| -> isize {
        if detach && nix::unistd::setsid().is_err() {
            return 1;
        }
        if let Some((reader, null)) = &detach_stdio {
            if nix::unistd::dup2_stdin(reader).is_err()
                || nix::unistd::dup2_stdout(null).is_err()
                || nix::unistd::dup2_stderr(null).is_err()
            {
                return 1;
            }
        }
        // execve only returns on failure; 127 mirrors the shell convention
        let _ = nix::unistd::execve(&argv[0], &argv, &envp);
        127
    });
    // SAFETY: the callback confines itself to setsid/dup/exec.
    let child_pid = unsafe { namespace::spawn_namespaced(callback, &mut stack) }?;
    drop(stage_child);

    if let Some(writer) = stdin_writer {
        std::thread::spawn(move || {
            let mut writer = File::from(writer);
            let _ = io::copy(&mut io::stdin(), &mut writer);
        });
    }

    // A single zero byte from the namespaced init; anything else means the
    // mount dance failed and the container never came up.
    handshake::recv_ready(&mut (&stage_parent))?;

    let init_pid = child_pid.as_raw();
    tracing::info!(pid = init_pid, "namespaced init confirmed running");

    // Handshake part B: report the PID. The runtime may already be moving
    // on, so a failed write is only worth a warning.
    if let Err(e) = handshake::send_pid(&mut (&init_pipe), init_pid) {
        tracing::warn!(error = %e, "failed to report init pid");
    }

    if detach {
        // Do not wait: exiting re-parents the init to PID 1, where it
        // lives on as a session leader.
        return Ok(());
    }

    match nix::sys::wait::waitpid(child_pid, None) {
        Ok(nix::sys::wait::WaitStatus::Exited(_, 0)) => Ok(()),
        Ok(status) => Err(MiniruntimeError::ChildWait {
            reason: format!("child stage terminated: {status:?}"),
        }),
        Err(e) => Err(MiniruntimeError::ChildWait {
            reason: e.to_string(),
        }),
    }
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — the stage pipeline requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn parent_stage() -> Result<()> {
    Err(miniruntime_common::error::MiniruntimeError::Spawn {
        what: "parent stage",
        source: std::io::Error::from(std::io::ErrorKind::Unsupported),
    })
}

/// Assembly of the child-stage argv and environment.
#[cfg(target_os = "linux")]
mod image {
    use std::ffi::CString;
    use std::io;
    use std::os::fd::RawFd;
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    use miniruntime_common::constants::{
        CHILD_STAGE, INIT_COMMAND, ROOTFS_PATH_ENV, SELF_EXE, STAGE_PIPE_ENV,
    };
    use miniruntime_common::error::{MiniruntimeError, Result};

    pub fn child_stage_argv() -> Result<Vec<CString>> {
        [SELF_EXE, INIT_COMMAND, CHILD_STAGE]
            .iter()
            .map(|arg| cstring(arg.as_bytes().to_vec()))
            .collect()
    }

    /// Current environment plus the stage-pipe fd number and the resolved
    /// rootfs, published under their contract variable names.
    pub fn child_stage_env(stage_pipe_fd: RawFd, rootfs: &str) -> Result<Vec<CString>> {
        let mut env = Vec::new();
        for (key, value) in std::env::vars_os() {
            let mut entry = key.into_vec();
            entry.push(b'=');
            entry.extend_from_slice(value.as_bytes());
            env.push(cstring(entry)?);
        }
        env.push(cstring(
            format!("{STAGE_PIPE_ENV}={stage_pipe_fd}").into_bytes(),
        )?);
        env.push(cstring(format!("{ROOTFS_PATH_ENV}={rootfs}").into_bytes())?);
        Ok(env)
    }

    fn cstring(bytes: Vec<u8>) -> Result<CString> {
        CString::new(bytes).map_err(|_| MiniruntimeError::Spawn {
            what: "child stage image",
            source: io::Error::from(io::ErrorKind::InvalidInput),
        })
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn argv_is_the_reserved_reexec_prefix() {
            let argv = child_stage_argv().expect("argv");
            let rendered: Vec<_> = argv
                .iter()
                .map(|a| a.to_str().expect("utf-8").to_string())
                .collect();
            assert_eq!(rendered, vec!["/proc/self/exe", "init", "CHILD_STAGE"]);
        }

        #[test]
        fn env_publishes_fd_and_rootfs() {
            let env = child_stage_env(7, "/alpine").expect("env");
            let rendered: Vec<_> = env
                .iter()
                .map(|e| e.to_str().expect("utf-8").to_string())
                .collect();
            assert!(rendered.contains(&"STAGE_PIPE=7".to_string()));
            assert!(rendered.contains(&"ROOTFS_PATH=/alpine".to_string()));
        }

        #[test]
        fn env_carries_the_current_environment_along() {
            std::env::set_var("MINIRUNTIME_TEST_MARKER", "present");
            let env = child_stage_env(3, "/alpine").expect("env");
            let found = env
                .iter()
                .any(|e| e.to_bytes() == b"MINIRUNTIME_TEST_MARKER=present");
            std::env::remove_var("MINIRUNTIME_TEST_MARKER");
            assert!(found);
        }
    }
}
