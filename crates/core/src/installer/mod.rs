//! Installer module for running downloaded installer binaries.
//!
//! This module provides the `InstallerRunner` trait and a process-backed
//! implementation. Installer output is not captured; whatever UI the
//! installer shows is outside this crate's control.

mod error;
mod process;
mod traits;

pub use error::RunError;
pub use process::{split_arguments, ProcessRunner};
pub use traits::{InstallerExit, InstallerRunner};
