//! Error types for the installer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running an installer.
#[derive(Debug, Error)]
pub enum RunError {
    /// Empty executable path.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The executable does not exist.
    #[error("Installer not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The process could not be started or waited on.
    #[error("Failed to launch {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
