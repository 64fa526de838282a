//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Directory receiving downloaded installers, one file per
    /// program/architecture pair.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("Downloads")
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}

impl OrchestratorConfig {
    /// Sets the download directory.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }
}
