//! Mock installer runner for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::installer::{InstallerExit, InstallerRunner, RunError};

/// A recorded installer run for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    /// Executable that was run.
    pub executable: PathBuf,
    /// Arguments passed verbatim.
    pub arguments: Option<String>,
    /// Exit reported, if the run got that far.
    pub exit: Option<InstallerExit>,
}

/// Failure to simulate for an executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockRunFailure {
    /// Report the executable as missing.
    NotFound,
    /// Report a launch failure.
    Launch,
}

/// Mock implementation of the InstallerRunner trait.
///
/// Provides controllable behavior for testing:
/// - Track runs for assertions
/// - Simulate exit codes and launch failures
/// - Treat a missing executable as `NotFound`, like the real runner
#[derive(Debug, Clone)]
pub struct MockInstaller {
    /// Recorded runs.
    runs: Arc<RwLock<Vec<RecordedRun>>>,
    /// Exit code reported by default.
    exit_code: Arc<RwLock<i32>>,
    /// Failures keyed by executable file name.
    failures: Arc<RwLock<HashMap<String, MockRunFailure>>>,
    /// Simulated installer duration in milliseconds.
    run_duration_ms: Arc<RwLock<u64>>,
}

impl Default for MockInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInstaller {
    /// Create a new mock installer that always succeeds.
    pub fn new() -> Self {
        Self {
            runs: Arc::new(RwLock::new(Vec::new())),
            exit_code: Arc::new(RwLock::new(0)),
            failures: Arc::new(RwLock::new(HashMap::new())),
            run_duration_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all recorded runs.
    pub async fn recorded_runs(&self) -> Vec<RecordedRun> {
        self.runs.read().await.clone()
    }

    /// Get the number of runs performed.
    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Exit code reported by every subsequent run.
    pub async fn set_exit_code(&self, code: i32) {
        *self.exit_code.write().await = code;
    }

    /// Make runs of the executable with this file name fail.
    pub async fn fail_executable(&self, file_name: &str, failure: MockRunFailure) {
        self.failures
            .write()
            .await
            .insert(file_name.to_string(), failure);
    }

    /// Set the simulated installer duration.
    pub async fn set_run_duration(&self, duration: Duration) {
        *self.run_duration_ms.write().await = duration.as_millis() as u64;
    }
}

#[async_trait]
impl InstallerRunner for MockInstaller {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(
        &self,
        executable: &Path,
        arguments: Option<&str>,
    ) -> Result<InstallerExit, RunError> {
        let file_name = executable
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let failure = self.failures.read().await.get(&file_name).copied();

        let result = match failure {
            Some(MockRunFailure::NotFound) => Err(RunError::NotFound {
                path: executable.to_path_buf(),
            }),
            Some(MockRunFailure::Launch) => Err(RunError::Launch {
                path: executable.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                ),
            }),
            None if !executable.exists() => Err(RunError::NotFound {
                path: executable.to_path_buf(),
            }),
            None => {
                let duration_ms = *self.run_duration_ms.read().await;
                if duration_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(duration_ms)).await;
                }
                Ok(InstallerExit::from_code(*self.exit_code.read().await))
            }
        };

        self.runs.write().await.push(RecordedRun {
            executable: executable.to_path_buf(),
            arguments: arguments.map(str::to_string),
            exit: result.as_ref().ok().copied(),
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_existing_file() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("Git_64-bit.exe");
        std::fs::write(&exe, b"MZ").unwrap();

        let installer = MockInstaller::new();
        let exit = installer.run(&exe, Some("/VERYSILENT")).await.unwrap();
        assert!(exit.success());

        let runs = installer.recorded_runs().await;
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].arguments.as_deref(), Some("/VERYSILENT"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let installer = MockInstaller::new();
        let err = installer
            .run(Path::new("/nonexistent/setup.exe"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_configured_launch_failure() {
        let installer = MockInstaller::new();
        installer
            .fail_executable("setup.exe", MockRunFailure::Launch)
            .await;
        let err = installer
            .run(Path::new("/x/setup.exe"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Launch { .. }));
    }
}
