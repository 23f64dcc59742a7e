//! End-to-end tests for the minirt runtime.
//!
//! These drive the real binary through a full container lifecycle and
//! therefore need root privileges and a staged alpine rootfs (at
//! `/vagrant/alpine` or `./alpine`). They are skipped unless the
//! environment sets `MINIRT_E2E=1`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

const RUNTIME_ROOT: &str = "/run/miniruntime";

fn e2e_enabled() -> bool {
    std::env::var("MINIRT_E2E").is_ok_and(|v| v == "1")
}

fn minirt() -> Command {
    Command::new(env!("CARGO_BIN_EXE_minirt"))
}

fn state_path(id: &str) -> PathBuf {
    Path::new(RUNTIME_ROOT).join(id).join("state.json")
}

fn reset_state(id: &str) {
    let _ = std::fs::remove_dir_all(Path::new(RUNTIME_ROOT).join(id));
}

fn write_config(dir: &Path, rootfs: &Path) -> PathBuf {
    let config = dir.join("config.json");
    std::fs::write(
        &config,
        format!(
            r#"{{"ociVersion":"1.0.2","root":{{"path":"{}"}}}}"#,
            rootfs.display()
        ),
    )
    .expect("write config");
    config
}

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = minirt()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn minirt");
    child
        .stdin
        .take()
        .expect("stdin handle")
        .write_all(stdin.as_bytes())
        .expect("feed stdin");
    child.wait_with_output().expect("wait for minirt")
}

fn read_state(id: &str) -> serde_json::Value {
    let raw = std::fs::read_to_string(state_path(id)).expect("read state.json");
    serde_json::from_str(&raw).expect("decode state.json")
}

fn pid_alive(pid: i64) -> bool {
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .status()
        .expect("run kill -0")
        .success()
}

fn parent_pid(pid: i64) -> Option<i64> {
    let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    status
        .lines()
        .find_map(|line| line.strip_prefix("PPid:"))
        .and_then(|value| value.trim().parse().ok())
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    condition()
}

// ── E1: echo passthrough ─────────────────────────────────────────────

#[test]
fn attached_run_passes_shell_output_through() {
    if !e2e_enabled() {
        eprintln!("skipping: MINIRT_E2E not set");
        return;
    }

    let id = "test_container";
    reset_state(id);
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &dir.path().join("rootfs"));

    let output = run_with_stdin(
        &["run", "-c", config.to_str().expect("utf-8"), id],
        "echo hello && exit\n",
    );

    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello"), "stdout was: {stdout}");
}

// ── E2: state file after attached run ────────────────────────────────

#[test]
fn attached_run_leaves_stopped_state_on_disk() {
    if !e2e_enabled() {
        eprintln!("skipping: MINIRT_E2E not set");
        return;
    }

    let id = "container_id";
    reset_state(id);
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &dir.path().join("rootfs"));

    let output = run_with_stdin(
        &["run", "-c", config.to_str().expect("utf-8"), id],
        "echo hi && exit\n",
    );
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let state = read_state(id);
    assert_eq!(state["id"], id);
    assert_eq!(state["status"], 2, "expected Stopped, state was: {state}");
    assert_ne!(state["initProcessPiD"], 0, "expected a recorded init pid");
}

// ── E3: detach, reparent to PID 1, then stop ─────────────────────────

#[test]
fn detached_run_survives_the_runtime_and_stops_by_id() {
    if !e2e_enabled() {
        eprintln!("skipping: MINIRT_E2E not set");
        return;
    }

    let id = "detachstop";
    reset_state(id);
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &dir.path().join("rootfs"));

    let output = run_with_stdin(
        &["run", "-d", "-c", config.to_str().expect("utf-8"), id],
        "sleep 30\n",
    );
    assert!(
        output.status.success(),
        "run -d failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let state = read_state(id);
    assert_eq!(state["status"], 1, "expected Running, state was: {state}");
    let pid = state["initProcessPiD"].as_i64().expect("pid");
    assert!(pid != 0);
    assert!(pid_alive(pid), "init process not running after run -d");

    // stage 1 exits on its own; the init must end up owned by PID 1
    assert!(
        wait_until(Duration::from_secs(5), || parent_pid(pid) == Some(1)),
        "init was not re-parented to PID 1 (ppid = {:?})",
        parent_pid(pid)
    );

    let stop = minirt().args(["stop", id]).output().expect("run stop");
    assert!(
        stop.status.success(),
        "stop failed: {}",
        String::from_utf8_lossy(&stop.stderr)
    );

    assert!(
        wait_until(Duration::from_secs(5), || !pid_alive(pid)),
        "init process still running after stop"
    );
    let state = read_state(id);
    assert_eq!(state["status"], 2, "expected Stopped, state was: {state}");
}
