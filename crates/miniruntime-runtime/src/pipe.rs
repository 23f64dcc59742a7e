//! File-descriptor plumbing between the runtime stages.
//!
//! Every socket pair has an owning side and a passed side. The retained
//! end is marked close-on-exec so it can never leak into a spawned stage;
//! the passed end stays inheritable, and its *actual* descriptor number is
//! published to the child through an environment variable — never derived
//! from a fd-ordering formula.

use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixStream;

use miniruntime_common::error::{MiniruntimeError, Result};
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::sys::socket::{socketpair, AddressFamily, SockFlag, SockType};

/// Creates the `AF_UNIX` stream pair used for a cross-stage handshake.
///
/// Returns the retained end (close-on-exec, wrapped for I/O) and the
/// passed end (inheritable, to be handed to the spawned stage).
///
/// # Errors
///
/// Returns `Spawn` if the socket pair cannot be created or flagged.
pub fn stage_socket_pair() -> Result<(UnixStream, OwnedFd)> {
    let (retained, passed) = socketpair(
        AddressFamily::Unix,
        SockType::Stream,
        None,
        SockFlag::empty(),
    )
    .map_err(|e| MiniruntimeError::Spawn {
        what: "handshake socket pair",
        source: std::io::Error::from_raw_os_error(e as i32),
    })?;
    set_cloexec(&retained)?;
    Ok((UnixStream::from(retained), passed))
}

/// Marks a descriptor close-on-exec so it does not survive into a spawned
/// stage's executable image.
///
/// # Errors
///
/// Returns `Spawn` if the `fcntl(2)` call fails.
pub fn set_cloexec(fd: &impl AsFd) -> Result<()> {
    fcntl(fd.as_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(|e| {
        MiniruntimeError::Spawn {
            what: "close-on-exec flag",
            source: std::io::Error::from_raw_os_error(e as i32),
        }
    })?;
    Ok(())
}

/// Reclaims a descriptor inherited across exec, whose number was published
/// as a decimal string in the given environment variable.
///
/// # Errors
///
/// Returns `Handshake` if the variable is unset or does not hold a fd
/// number.
pub fn inherited_stream(env_var: &str) -> Result<UnixStream> {
    let value = std::env::var(env_var).map_err(|_| MiniruntimeError::Handshake {
        reason: format!("{env_var} is not set"),
    })?;
    stream_from_fd_str(env_var, &value)
}

/// Wraps an inherited descriptor number for stream I/O.
///
/// # Errors
///
/// Returns `Handshake` if the value is not a valid fd number.
pub fn stream_from_fd_str(env_var: &str, value: &str) -> Result<UnixStream> {
    let fd: RawFd = value.parse().map_err(|_| MiniruntimeError::Handshake {
        reason: format!("{env_var} holds invalid fd number {value:?}"),
    })?;
    // SAFETY: the parent stage left exactly this descriptor open across
    // exec and published its number; nothing else in this process owns it.
    let owned = unsafe { OwnedFd::from_raw_fd(fd) };
    Ok(UnixStream::from(owned))
}

/// Creates the ordinary pipe that bridges the runtime's stdin into a
/// detached container. Returns `(read_end, write_end)`.
///
/// Both raw ends are close-on-exec: the read end reaches the init only as
/// a `dup2` copy on fd 0, and the write end stays with the bridging
/// thread. Without the flag the init would inherit its own stdin's write
/// end and never see EOF.
///
/// # Errors
///
/// Returns `Spawn` if the `pipe(2)` call fails.
pub fn stdin_bridge_pipe() -> Result<(OwnedFd, OwnedFd)> {
    let (reader, writer) = nix::unistd::pipe().map_err(|e| MiniruntimeError::Spawn {
        what: "stdin bridge pipe",
        source: std::io::Error::from_raw_os_error(e as i32),
    })?;
    set_cloexec(&reader)?;
    set_cloexec(&writer)?;
    Ok((reader, writer))
}

/// Formats a passed descriptor for publication in the environment.
#[must_use]
pub fn fd_env_value(fd: &OwnedFd) -> String {
    fd.as_raw_fd().to_string()
}
