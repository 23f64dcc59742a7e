//! Persistent per-container state.
//!
//! Each container owns a directory `<runtime_root>/<id>` holding a single
//! pretty-printed `state.json`. The document is only ever replaced in
//! full: encode into a temporary file, fsync, rename. Readers observe
//! either the previous or the next version, never a torn write.

use std::fs;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use miniruntime_common::constants::STATE_FILE_NAME;
use miniruntime_common::error::{MiniruntimeError, Result};
use miniruntime_common::types::{ContainerId, Status};
use serde::{Deserialize, Serialize};

/// Persistent record of a single container.
///
/// Field names and the integer `status` encoding are part of the on-disk
/// format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    /// Container identifier; doubles as the state directory name.
    pub id: ContainerId,

    /// Host-namespace PID of the namespaced init process; `0` until stage 2
    /// has been confirmed running.
    #[serde(rename = "initProcessPiD")]
    pub init_process_pid: i32,

    /// Moment the runtime accepted the run request.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Lifecycle state; advances monotonically Created → Running → Stopped.
    pub status: Status,

    /// Source bundle identifier; may be empty.
    pub bundle: String,
}

impl Container {
    /// Creates a fresh record in the `Created` state.
    #[must_use]
    pub fn new(id: ContainerId) -> Self {
        Self {
            id,
            init_process_pid: 0,
            created_at: Utc::now(),
            status: Status::Created,
            bundle: String::new(),
        }
    }
}

/// Returns the state directory for a container under the given runtime root.
#[must_use]
pub fn state_dir(runtime_root: &Path, id: &ContainerId) -> PathBuf {
    runtime_root.join(id.as_str())
}

/// Persists a container record, creating the state directory if needed.
///
/// The directory (and any missing parents) is created with mode `0700`;
/// the record file is created with mode `0600`.
///
/// # Errors
///
/// Returns `StateWrite` if the directory cannot be created or the record
/// cannot be encoded, synced, or renamed into place.
pub fn save_state(state_dir: &Path, container: &Container) -> Result<()> {
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(state_dir)
        .map_err(|e| MiniruntimeError::StateWrite {
            path: state_dir.to_path_buf(),
            source: e,
        })?;

    let tmp_path = state_dir.join(format!("{STATE_FILE_NAME}.tmp"));
    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&tmp_path)
        .map_err(|e| MiniruntimeError::StateWrite {
            path: tmp_path.clone(),
            source: e,
        })?;

    serde_json::to_writer_pretty(&file, container).map_err(|e| MiniruntimeError::StateWrite {
        path: tmp_path.clone(),
        source: e.into(),
    })?;
    file.sync_all().map_err(|e| MiniruntimeError::StateWrite {
        path: tmp_path.clone(),
        source: e,
    })?;

    let final_path = state_dir.join(STATE_FILE_NAME);
    fs::rename(&tmp_path, &final_path).map_err(|e| MiniruntimeError::StateWrite {
        path: final_path.clone(),
        source: e,
    })?;

    tracing::debug!(path = %final_path.display(), status = %container.status, "state saved");
    Ok(())
}

/// Loads a container record from its state directory.
///
/// # Errors
///
/// Returns `StateRead` if the record cannot be read or decoded.
pub fn load_state(state_dir: &Path) -> Result<Container> {
    let path = state_dir.join(STATE_FILE_NAME);
    let content = fs::read_to_string(&path).map_err(|e| MiniruntimeError::StateRead {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    let container = serde_json::from_str(&content).map_err(|e| MiniruntimeError::StateRead {
        path,
        reason: e.to_string(),
    })?;
    Ok(container)
}
