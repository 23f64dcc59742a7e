//! Container root filesystem isolation.
//!
//! [`mount`] holds thin wrappers over the individual `mount(2)`/`umount2(2)`
//! operations; [`pivot_root`] composes them into the strict sequence that
//! swaps the init process onto the container rootfs.

pub mod mount;
pub mod pivot_root;

pub use pivot_root::switch_root;
