//! Trait definitions for the installer module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::RunError;

/// How an installer process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerExit {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl InstallerExit {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for InstallerExit {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Something that can execute an installer and wait for it.
#[async_trait]
pub trait InstallerRunner: Send + Sync {
    /// Returns the name of this runner implementation.
    fn name(&self) -> &str;

    /// Runs `executable` with `arguments` and waits for it to exit.
    async fn run(&self, executable: &Path, arguments: Option<&str>)
        -> Result<InstallerExit, RunError>;
}
