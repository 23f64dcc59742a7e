//! The typed startup protocol spoken over the stage pipes.
//!
//! On the init pipe (stage 0 ↔ stage 1):
//!
//! ```text
//! stage0 → stage1   JSON line of StageOptions   "here is your config"
//! stage1 → stage0   0x00                        "parent-stage alive"
//! stage1 → stage0   "pid:<decimal>\n"           "namespaced init PID"
//! ```
//!
//! On the stage pipe (stage 1 ↔ stage 2) a single `0x00` flows up once the
//! mount dance has succeeded. Any deviation from the expected bytes is a
//! `Handshake` error; there are no retries.

use std::io::{BufRead, Read, Write};

use miniruntime_common::error::{MiniruntimeError, Result};
use serde::{Deserialize, Serialize};

/// Byte written by a stage to signal it is alive and set up.
pub const READY_BYTE: u8 = 0;

const PID_PREFIX: &str = "pid:";

/// Ephemeral configuration sent from the runtime to the parent stage.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOptions {
    /// Whether the runtime detaches once the init is confirmed running.
    pub detach: bool,
    /// Resolved rootfs directory for the container.
    pub rootfs: String,
}

/// Sends the stage options as a single JSON line.
///
/// # Errors
///
/// Returns `Handshake` if encoding or the write fails.
pub fn send_options<W: Write>(writer: &mut W, options: &StageOptions) -> Result<()> {
    let mut line = serde_json::to_string(options).map_err(|e| MiniruntimeError::Handshake {
        reason: format!("cannot encode stage options: {e}"),
    })?;
    line.push('\n');
    writer
        .write_all(line.as_bytes())
        .map_err(|e| MiniruntimeError::Handshake {
            reason: format!("cannot send stage options: {e}"),
        })
}

/// Reads the stage-options line sent by the runtime.
///
/// # Errors
///
/// Returns `Handshake` if the line cannot be read or decoded.
pub fn recv_options<R: BufRead>(reader: &mut R) -> Result<StageOptions> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| MiniruntimeError::Handshake {
            reason: format!("cannot read stage options: {e}"),
        })?;
    serde_json::from_str(line.trim_end()).map_err(|e| MiniruntimeError::Handshake {
        reason: format!("cannot decode stage options: {e}"),
    })
}

/// Signals readiness with a single zero byte.
///
/// # Errors
///
/// Returns `Handshake` if the write fails.
pub fn send_ready<W: Write>(writer: &mut W) -> Result<()> {
    writer
        .write_all(&[READY_BYTE])
        .map_err(|e| MiniruntimeError::Handshake {
            reason: format!("cannot send readiness byte: {e}"),
        })
}

/// Reads exactly one readiness byte, requiring the zero value.
///
/// # Errors
///
/// Returns `Handshake` on a short read or any non-zero value.
pub fn recv_ready<R: Read>(reader: &mut R) -> Result<()> {
    let mut buf = [0u8; 1];
    reader
        .read_exact(&mut buf)
        .map_err(|e| MiniruntimeError::Handshake {
            reason: format!("readiness byte not received: {e}"),
        })?;
    if buf[0] != READY_BYTE {
        return Err(MiniruntimeError::Handshake {
            reason: format!("unexpected readiness byte {} != 0", buf[0]),
        });
    }
    Ok(())
}

/// Reports the namespaced init PID as `pid:<decimal>\n`.
///
/// # Errors
///
/// Returns `Handshake` if the write fails.
pub fn send_pid<W: Write>(writer: &mut W, pid: i32) -> Result<()> {
    writer
        .write_all(format!("{PID_PREFIX}{pid}\n").as_bytes())
        .map_err(|e| MiniruntimeError::Handshake {
            reason: format!("cannot send pid report: {e}"),
        })
}

/// Stage-0 half of the handshake: consumes the readiness byte, then the
/// PID report line, and returns the namespaced init PID.
///
/// # Errors
///
/// Returns `Handshake` on any protocol deviation: wrong readiness byte,
/// missing `pid:` prefix, or a non-numeric PID.
pub fn read_init_report<R: BufRead>(reader: &mut R) -> Result<i32> {
    recv_ready(reader)?;

    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| MiniruntimeError::Handshake {
            reason: format!("pid report not received: {e}"),
        })?;
    let line = line.trim_end();
    let digits = line
        .strip_prefix(PID_PREFIX)
        .ok_or_else(|| MiniruntimeError::Handshake {
            reason: format!("unexpected init message {line:?}"),
        })?;
    digits.parse().map_err(|_| MiniruntimeError::Handshake {
        reason: format!("invalid pid {digits:?}"),
    })
}
