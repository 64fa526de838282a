//! Process-backed installer runner.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::error::RunError;
use super::traits::{InstallerExit, InstallerRunner};

/// Runs installers as child processes.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

/// Splits an installer argument string into argv entries the way a Windows
/// command line is read: whitespace separates entries, double quotes group
/// (and are removed), `\"` is a literal quote. Other backslashes are kept.
///
/// Used where the platform has no raw command line to hand over.
pub fn split_arguments(arguments: Option<&str>) -> Vec<String> {
    let Some(arguments) = arguments else {
        return Vec::new();
    };

    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut chars = arguments.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
                in_token = true;
            }
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        args.push(current);
    }

    args
}

/// Hands the argument string to the child unchanged.
#[cfg(windows)]
fn apply_arguments(command: &mut Command, arguments: Option<&str>) {
    if let Some(arguments) = arguments.map(str::trim).filter(|a| !a.is_empty()) {
        command.raw_arg(arguments);
    }
}

#[cfg(not(windows))]
fn apply_arguments(command: &mut Command, arguments: Option<&str>) {
    command.args(split_arguments(arguments));
}

#[async_trait]
impl InstallerRunner for ProcessRunner {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(
        &self,
        executable: &Path,
        arguments: Option<&str>,
    ) -> Result<InstallerExit, RunError> {
        if executable.as_os_str().is_empty() {
            return Err(RunError::InvalidArgument(
                "executable path is empty".to_string(),
            ));
        }

        let is_file = tokio::fs::metadata(executable)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(RunError::NotFound {
                path: executable.to_path_buf(),
            });
        }

        debug!("Launching {:?} with {:?}", executable, arguments);

        let launch_error = |source| RunError::Launch {
            path: executable.to_path_buf(),
            source,
        };

        let mut command = Command::new(executable);
        apply_arguments(&mut command, arguments);

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(launch_error)?;

        let status = child.wait().await.map_err(launch_error)?;
        debug!("{:?} exited with {:?}", executable, status.code());

        Ok(InstallerExit::from(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_arguments() {
        assert!(split_arguments(None).is_empty());
        assert!(split_arguments(Some("   ")).is_empty());
        assert_eq!(
            split_arguments(Some("  /S  /D=C:\\Apps ")),
            vec!["/S", "/D=C:\\Apps"]
        );
    }

    #[test]
    fn test_split_arguments_keeps_quoted_spaces() {
        assert_eq!(
            split_arguments(Some(r#"/S /D="C:\Program Files\App" INSTALLDIR="C:\Program Files\X""#)),
            vec![
                "/S",
                r"/D=C:\Program Files\App",
                r"INSTALLDIR=C:\Program Files\X",
            ]
        );
        assert_eq!(
            split_arguments(Some(r#""" /LOG="setup log.txt" /TITLE=\"Q\""#)),
            vec!["", "/LOG=setup log.txt", r#"/TITLE="Q""#]
        );
    }

    #[test]
    fn test_split_arguments_unterminated_quote_runs_to_end() {
        assert_eq!(
            split_arguments(Some(r#"/S /DIR="C:\My Apps"#)),
            vec!["/S", r"/DIR=C:\My Apps"]
        );
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let runner = ProcessRunner::new();
        let err = runner
            .run(Path::new("/nonexistent/setup.exe"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_directory_is_not_an_installer() {
        let dir = TempDir::new().unwrap();
        let runner = ProcessRunner::new();
        let err = runner.run(dir.path(), None).await.unwrap_err();
        assert!(matches!(err, RunError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_path() {
        let runner = ProcessRunner::new();
        let err = runner.run(Path::new(""), None).await.unwrap_err();
        assert!(matches!(err, RunError::InvalidArgument(_)));
    }

    #[cfg(unix)]
    fn script(dir: &TempDir, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("setup.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "exit 3");
        let exit = ProcessRunner::new().run(&path, None).await.unwrap();
        assert_eq!(exit, InstallerExit::from_code(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_arguments_are_passed() {
        let dir = TempDir::new().unwrap();
        let path = script(&dir, "[ \"$1\" = \"/S\" ] && [ \"$2\" = \"/quiet\" ]");
        let exit = ProcessRunner::new()
            .run(&path, Some("/S /quiet"))
            .await
            .unwrap();
        assert!(exit.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_quoted_argument_with_space_arrives_whole() {
        let dir = TempDir::new().unwrap();
        let path = script(
            &dir,
            "[ \"$#\" = 2 ] && [ \"$1\" = \"/S\" ] && [ \"$2\" = \"/D=C:/Program Files/App\" ]",
        );
        let exit = ProcessRunner::new()
            .run(&path, Some(r#"/S /D="C:/Program Files/App""#))
            .await
            .unwrap();
        assert!(exit.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_executable_file_fails_to_launch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("setup.exe");
        std::fs::write(&path, b"not a program").unwrap();
        let err = ProcessRunner::new().run(&path, None).await.unwrap_err();
        assert!(matches!(err, RunError::Launch { .. }));
    }
}
