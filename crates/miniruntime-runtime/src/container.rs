//! Core container lifecycle operations (stage 0).
//!
//! `run_container` drives the whole launch: resolve the rootfs from the
//! runtime spec, stage it, persist the `Created` record, spawn the
//! parent-stage driver over the init pipe, complete the handshake, and
//! either detach or wait the container out. `stop_container` addresses a
//! detached container purely by its recorded PID.

use std::io::BufReader;
use std::path::Path;

use miniruntime_common::config;
use miniruntime_common::constants::{
    INIT_COMMAND, INIT_PIPE_ENV, PARENT_STAGE, SELF_EXE, STATE_FILE_NAME,
};
use miniruntime_common::error::{MiniruntimeError, Result};
use miniruntime_common::types::{ContainerId, Status};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::handshake::{self, StageOptions};
use crate::pipe;
use crate::stager;
use crate::state::{self, Container};

/// Launches a container.
///
/// In detached mode the function returns as soon as the namespaced init is
/// confirmed running and the `Running` record is persisted; the init keeps
/// running under PID 1. Otherwise it waits for the container to exit and
/// records `Stopped`.
///
/// # Errors
///
/// Returns `SpecLoad`, `RootfsMissing`, `StateWrite`, `Spawn`, `Handshake`,
/// or `ChildWait`, per the phase that failed.
pub fn run_container(
    runtime_root: &Path,
    id: &ContainerId,
    config_path: &Path,
    detach: bool,
) -> Result<()> {
    let spec = config::load_spec(config_path)?;
    let rootfs = spec.rootfs_path().to_string();

    stager::stage_rootfs(Path::new(&rootfs))?;

    let state_dir = state::state_dir(runtime_root, id);
    let mut container = Container::new(id.clone());
    state::save_state(&state_dir, &container)?;

    let (init_parent, init_child) = pipe::stage_socket_pair()?;

    let mut command = std::process::Command::new(SELF_EXE);
    command
        .arg(INIT_COMMAND)
        .arg(PARENT_STAGE)
        .env(INIT_PIPE_ENV, pipe::fd_env_value(&init_child));

    tracing::info!(id = %id, rootfs = %rootfs, "spawning parent stage");
    let mut parent_stage = command.spawn().map_err(|e| MiniruntimeError::Spawn {
        what: "parent stage",
        source: e,
    })?;
    drop(init_child);

    let options = StageOptions { detach, rootfs };
    if let Err(e) = handshake::send_options(&mut (&init_parent), &options) {
        // The driver never came up; don't leave a zombie behind.
        let _ = parent_stage.kill();
        let _ = parent_stage.wait();
        return Err(e);
    }

    let init_pid = match handshake::read_init_report(&mut BufReader::new(&init_parent)) {
        Ok(pid) => pid,
        Err(e) => {
            let _ = parent_stage.wait();
            return Err(e);
        }
    };

    container.init_process_pid = init_pid;
    container.status = Status::Running;
    state::save_state(&state_dir, &container)?;
    tracing::info!(id = %id, pid = init_pid, "container running");

    if detach {
        // Release the handle without waiting. Stage 1 exits on its own
        // once it has reported the PID; the init is re-parented to PID 1.
        return Ok(());
    }

    let status = parent_stage.wait().map_err(|e| MiniruntimeError::ChildWait {
        reason: e.to_string(),
    })?;
    if !status.success() {
        return Err(MiniruntimeError::ChildWait {
            reason: format!("parent stage exited with {status}"),
        });
    }

    container.status = Status::Stopped;
    state::save_state(&state_dir, &container)?;
    tracing::info!(id = %id, "container exited");
    Ok(())
}

/// Stops a container by sending SIGKILL to its recorded init process.
///
/// Does not wait for reaping: in detached mode the init is owned by PID 1.
/// Calling this on an already-stopped container yields `NotRunning` and
/// does not re-signal.
///
/// # Errors
///
/// Returns `NotFound` if no record exists, `NotRunning` if the recorded
/// status is not `Running`, and `Signal` if the kill syscall fails.
pub fn stop_container(runtime_root: &Path, id: &ContainerId) -> Result<()> {
    let state_dir = state::state_dir(runtime_root, id);
    if !state_dir.join(STATE_FILE_NAME).exists() {
        return Err(MiniruntimeError::NotFound { id: id.to_string() });
    }

    let mut container = state::load_state(&state_dir)?;
    if container.status != Status::Running {
        return Err(MiniruntimeError::NotRunning { id: id.to_string() });
    }

    kill(Pid::from_raw(container.init_process_pid), Signal::SIGKILL).map_err(|e| {
        MiniruntimeError::Signal {
            pid: container.init_process_pid,
            source: e,
        }
    })?;

    container.status = Status::Stopped;
    state::save_state(&state_dir, &container)?;
    tracing::info!(id = %id, pid = container.init_process_pid, "container stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_id(value: &str) -> ContainerId {
        ContainerId::new(value).expect("valid id")
    }

    #[test]
    fn stop_kills_a_running_init_process() {
        let root = tempfile::tempdir().expect("tempdir");
        let id = sample_id("stoptest");

        // a dummy process stands in for the container init
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep");
        let pid = i32::try_from(child.id()).expect("pid fits");

        let state_dir = state::state_dir(root.path(), &id);
        let mut container = Container::new(id.clone());
        container.init_process_pid = pid;
        container.status = Status::Running;
        state::save_state(&state_dir, &container).expect("save");

        stop_container(root.path(), &id).expect("stop should succeed");

        // reap before probing, a zombie still answers signal 0
        let _ = child.wait();
        let probe = kill(Pid::from_raw(pid), None);
        assert!(probe.is_err(), "init process still running after stop");

        let loaded = state::load_state(&state_dir).expect("load");
        assert_eq!(loaded.status, Status::Stopped);
    }

    #[test]
    fn stop_non_running_container_does_not_signal() {
        let root = tempfile::tempdir().expect("tempdir");
        let id = sample_id("already-stopped");

        let state_dir = state::state_dir(root.path(), &id);
        let mut container = Container::new(id.clone());
        container.init_process_pid = 12345;
        container.status = Status::Stopped;
        state::save_state(&state_dir, &container).expect("save");

        let err = stop_container(root.path(), &id).expect_err("must fail");
        assert!(matches!(err, MiniruntimeError::NotRunning { .. }));

        let loaded = state::load_state(&state_dir).expect("load");
        assert_eq!(loaded.status, Status::Stopped, "record must be untouched");
    }

    #[test]
    fn stop_created_container_is_not_running() {
        let root = tempfile::tempdir().expect("tempdir");
        let id = sample_id("created-only");

        let state_dir = state::state_dir(root.path(), &id);
        state::save_state(&state_dir, &Container::new(id.clone())).expect("save");

        let err = stop_container(root.path(), &id).expect_err("must fail");
        assert!(matches!(err, MiniruntimeError::NotRunning { .. }));
    }

    #[test]
    fn stop_unknown_container_is_not_found() {
        let root = tempfile::tempdir().expect("tempdir");
        let err = stop_container(root.path(), &sample_id("ghost")).expect_err("must fail");
        assert!(matches!(err, MiniruntimeError::NotFound { .. }));
    }

    #[test]
    fn run_with_unreadable_spec_creates_no_state() {
        let root = tempfile::tempdir().expect("tempdir");
        let id = sample_id("nospec");

        let err = run_container(
            root.path(),
            &id,
            Path::new("/nonexistent/config.json"),
            false,
        )
        .expect_err("must fail");
        assert!(matches!(err, MiniruntimeError::SpecLoad { .. }));
        assert!(!state::state_dir(root.path(), &id).exists());
    }

    #[test]
    fn run_with_missing_source_rootfs_creates_no_state() {
        let root = tempfile::tempdir().expect("tempdir");
        let id = sample_id("norootfs");

        let config = root.path().join("config.json");
        let dest = root.path().join("rootfs");
        std::fs::write(
            &config,
            format!(r#"{{"ociVersion":"1.0.2","root":{{"path":"{}"}}}}"#, dest.display()),
        )
        .expect("write config");

        let err = run_container(root.path(), &id, &config, false).expect_err("must fail");
        assert!(matches!(err, MiniruntimeError::RootfsMissing { .. }));
        assert!(!state::state_dir(root.path(), &id).exists());
    }
}
