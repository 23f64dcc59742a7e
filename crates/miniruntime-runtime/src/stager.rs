//! Staging of the container source rootfs.
//!
//! The source tree lives at a fixed primary location, with a CWD-relative
//! fallback for running outside the provisioned VM. Its *contents* are
//! copied into the destination (not nested), preserving ownership, modes,
//! symlinks, and extended attributes.

use std::path::{Path, PathBuf};
use std::process::Command;

use miniruntime_common::constants::{ROOTFS_SOURCE_FALLBACK, ROOTFS_SOURCE_PRIMARY};
use miniruntime_common::error::{MiniruntimeError, Result};

/// Materializes the source rootfs tree under `dest`.
///
/// # Errors
///
/// Returns `RootfsMissing` if the source tree exists at neither candidate
/// location, `StateWrite` if `dest` cannot be created, and `Spawn` /
/// `ChildWait` if the copy process fails.
pub fn stage_rootfs(dest: &Path) -> Result<()> {
    let fallback = std::env::current_dir()
        .map_or_else(|_| PathBuf::from(ROOTFS_SOURCE_FALLBACK), |cwd| {
            cwd.join(ROOTFS_SOURCE_FALLBACK)
        });
    let source = locate_source(Path::new(ROOTFS_SOURCE_PRIMARY), &fallback)?;
    copy_tree(&source, dest)?;
    tracing::info!(source = %source.display(), dest = %dest.display(), "rootfs staged");
    Ok(())
}

/// Resolves the source tree: fixed primary location first, then the
/// CWD-relative fallback.
fn locate_source(primary: &Path, fallback: &Path) -> Result<PathBuf> {
    if primary.is_dir() {
        return Ok(primary.to_path_buf());
    }
    if fallback.is_dir() {
        return Ok(fallback.to_path_buf());
    }
    Err(MiniruntimeError::RootfsMissing {
        primary: primary.to_path_buf(),
        fallback: fallback.to_path_buf(),
    })
}

/// Copies the contents of `source` into `dest` with attributes preserved.
fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest).map_err(|e| MiniruntimeError::StateWrite {
        path: dest.to_path_buf(),
        source: e,
    })?;

    // `cp -a <source>/. <dest>` copies contents rather than nesting the
    // directory, and `-a` preserves mode, ownership, links, and xattrs.
    let status = Command::new("cp")
        .arg("-a")
        .arg(format!("{}/.", source.display()))
        .arg(dest)
        .status()
        .map_err(|e| MiniruntimeError::Spawn {
            what: "cp -a",
            source: e,
        })?;
    if !status.success() {
        return Err(MiniruntimeError::ChildWait {
            reason: format!("cp -a exited with {status}"),
        });
    }
    Ok(())
}
