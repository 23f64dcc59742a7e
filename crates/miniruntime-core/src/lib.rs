//! # miniruntime-core
//!
//! Low-level Linux isolation primitives for the miniruntime runtime.
//!
//! This crate provides thin abstractions over:
//! - **Namespaces**: the `clone(2)` call that starts the container init
//!   inside fresh PID, mount, network, UTS, and cgroup namespaces.
//! - **Filesystem**: the bind/`pivot_root`/unmount sequence that swaps the
//!   container onto its own root filesystem.
//!
//! Everything here runs inside the re-executed stage processes; nothing in
//! this crate touches persisted state.

pub mod filesystem;
pub mod namespace;
