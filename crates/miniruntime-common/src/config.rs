//! OCI runtime-spec configuration subset.
//!
//! The runtime consumes exactly one field of the document: `.root.path`.
//! Everything else is accepted and ignored so that real runtime-spec
//! bundles load without modification.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MiniruntimeError, Result};

/// Parsed subset of an OCI runtime-spec `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeSpec {
    /// Spec version declared by the bundle.
    #[serde(default, rename = "ociVersion")]
    pub oci_version: String,

    /// Root filesystem configuration.
    #[serde(default)]
    pub root: Option<RootConfig>,
}

/// The `root` object of a runtime-spec document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootConfig {
    /// Path to the container's root filesystem.
    #[serde(default)]
    pub path: String,

    /// Whether the rootfs should be mounted read-only. Unused.
    #[serde(default)]
    pub readonly: bool,
}

impl RuntimeSpec {
    /// Returns the configured rootfs path, falling back to the default
    /// when the spec names none.
    #[must_use]
    pub fn rootfs_path(&self) -> &str {
        match &self.root {
            Some(root) if !root.path.is_empty() => &root.path,
            _ => crate::constants::DEFAULT_ROOTFS,
        }
    }
}

/// Loads a runtime-spec document from the given path.
///
/// # Errors
///
/// Returns `SpecLoad` if the file cannot be opened or decoded.
pub fn load_spec(path: &Path) -> Result<RuntimeSpec> {
    let file = File::open(path).map_err(|e| MiniruntimeError::SpecLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let spec = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        MiniruntimeError::SpecLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_spec_reads_root_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"ociVersion":"1.0.2","root":{"path":"/tmp/rootfs"}}"#,
        )
        .expect("write config");

        let spec = load_spec(&path).expect("load should succeed");
        assert_eq!(spec.oci_version, "1.0.2");
        assert_eq!(spec.rootfs_path(), "/tmp/rootfs");
    }

    #[test]
    fn rootfs_path_defaults_when_absent() {
        let spec = RuntimeSpec::default();
        assert_eq!(spec.rootfs_path(), crate::constants::DEFAULT_ROOTFS);
    }

    #[test]
    fn rootfs_path_defaults_when_empty() {
        let spec = RuntimeSpec {
            root: Some(RootConfig::default()),
            ..RuntimeSpec::default()
        };
        assert_eq!(spec.rootfs_path(), crate::constants::DEFAULT_ROOTFS);
    }

    #[test]
    fn load_spec_missing_file_fails() {
        let err = load_spec(Path::new("/nonexistent/config.json"))
            .expect_err("missing file must fail");
        assert!(matches!(err, MiniruntimeError::SpecLoad { .. }));
    }

    #[test]
    fn load_spec_rejects_invalid_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").expect("write config");

        let err = load_spec(&path).expect_err("invalid json must fail");
        assert!(matches!(err, MiniruntimeError::SpecLoad { .. }));
    }

    #[test]
    fn load_spec_ignores_unknown_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"ociVersion":"1.0.2","process":{"args":["sh"]},"root":{"path":"/r"}}"#,
        )
        .expect("write config");

        let spec = load_spec(&path).expect("load should succeed");
        assert_eq!(spec.rootfs_path(), "/r");
    }
}
