//! Domain primitive types used across the miniruntime workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MiniruntimeError, Result};

/// Unique identifier for a container instance.
///
/// Ids are chosen by the caller and are opaque to the runtime; the only
/// requirement is that they are non-empty, since the id doubles as the
/// state directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a caller-supplied string.
    ///
    /// # Errors
    ///
    /// Returns `BadInput` if the id is empty.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(MiniruntimeError::BadInput {
                message: "container id must not be empty".into(),
            });
        }
        Ok(Self(id))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a container.
///
/// Persisted as a bare integer (`0`/`1`/`2`); the encoding is part of the
/// on-disk state format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    /// Container record exists but the init process has not been confirmed.
    Created,
    /// Init process confirmed started inside its namespaces.
    Running,
    /// Container has been stopped or has exited.
    Stopped,
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        match status {
            Status::Created => 0,
            Status::Running => 1,
            Status::Stopped => 2,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Created),
            1 => Ok(Self::Running),
            2 => Ok(Self::Stopped),
            other => Err(format!("invalid container status {other}")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_id_rejects_empty() {
        let err = ContainerId::new("").expect_err("empty id must be rejected");
        assert!(matches!(err, MiniruntimeError::BadInput { .. }));
    }

    #[test]
    fn container_id_roundtrips_value() {
        let id = ContainerId::new("web-1").expect("valid id");
        assert_eq!(id.as_str(), "web-1");
        assert_eq!(format!("{id}"), "web-1");
    }

    #[test]
    fn status_encodes_as_integer() {
        assert_eq!(serde_json::to_string(&Status::Created).expect("encode"), "0");
        assert_eq!(serde_json::to_string(&Status::Running).expect("encode"), "1");
        assert_eq!(serde_json::to_string(&Status::Stopped).expect("encode"), "2");
    }

    #[test]
    fn status_decodes_from_integer() {
        let status: Status = serde_json::from_str("1").expect("decode");
        assert_eq!(status, Status::Running);
    }

    #[test]
    fn status_rejects_unknown_integer() {
        let result = serde_json::from_str::<Status>("3");
        assert!(result.is_err(), "unknown status value should be rejected");
    }

    #[test]
    fn status_display() {
        assert_eq!(format!("{}", Status::Created), "created");
        assert_eq!(format!("{}", Status::Running), "running");
        assert_eq!(format!("{}", Status::Stopped), "stopped");
    }
}
