//! Container lifecycle management for the miniruntime runtime.
//!
//! One binary, three process roles: [`container`] implements the
//! user-facing runtime (stage 0), [`process`] the re-executed parent-stage
//! driver (stage 1), and [`init`] the namespaced init (stage 2). The roles
//! talk over the socket pairs in [`pipe`] using the protocol in
//! [`handshake`], and stage 0 persists the container record via [`state`].

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod container;
pub mod handshake;
pub mod init;
pub mod pipe;
pub mod process;
pub mod stager;
pub mod state;
