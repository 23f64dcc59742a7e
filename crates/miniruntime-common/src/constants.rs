//! System-wide constants and default paths.

/// Default base directory for per-container state directories.
pub const DEFAULT_RUNTIME_ROOT: &str = "/run/miniruntime";

/// File name of the persisted container record inside a state directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Rootfs used when the runtime spec does not name one.
pub const DEFAULT_ROOTFS: &str = "/alpine";

/// Fixed primary location of the source rootfs tree.
pub const ROOTFS_SOURCE_PRIMARY: &str = "/vagrant/alpine";

/// Fallback source rootfs directory, resolved relative to the process CWD.
pub const ROOTFS_SOURCE_FALLBACK: &str = "alpine";

/// Default OCI runtime config path consumed by `run`.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Payload executed inside the container once isolation is complete.
pub const CONTAINER_SHELL: &str = "/bin/sh";

/// Path used to re-invoke the running binary for stages 1 and 2.
pub const SELF_EXE: &str = "/proc/self/exe";

/// Reserved first argument marking a re-executed stage.
pub const INIT_COMMAND: &str = "init";

/// Stage token for the parent-stage driver (stage 1).
pub const PARENT_STAGE: &str = "PARENT_STAGE";

/// Stage token for the namespaced init (stage 2).
pub const CHILD_STAGE: &str = "CHILD_STAGE";

/// Environment variable carrying the init-pipe fd number into stage 1.
pub const INIT_PIPE_ENV: &str = "INIT_PIPE";

/// Environment variable carrying the stage-pipe fd number into stage 2.
pub const STAGE_PIPE_ENV: &str = "STAGE_PIPE";

/// Environment variable carrying the resolved rootfs path into stage 2.
pub const ROOTFS_PATH_ENV: &str = "ROOTFS_PATH";

/// Application name used in logs and state files.
pub const APP_NAME: &str = "miniruntime";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "minirt";
