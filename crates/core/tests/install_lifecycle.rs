//! Install-after-download integration tests.
//!
//! Covers the install step of the pipeline: argument passing, exit code
//! handling, launch failures and the terminal status of install runs.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::RwLock;

use quickinstall_core::{
    orchestrator::{destination_path, INSTALLATION_COMPLETE},
    testing::{fixtures, MockFetchFailure, MockFetcher, MockInstaller, MockRunFailure},
    Catalog, EventStream, Orchestrator, OrchestratorConfig, OrchestratorEvent, PipelineError,
    PipelineOutcome, ProgramEntry, RunError, SelectionState,
};

struct TestHarness {
    orchestrator: Orchestrator,
    events: EventStream,
    fetcher: MockFetcher,
    installer: MockInstaller,
    download_dir: TempDir,
}

impl TestHarness {
    /// Harness with install-after-download enabled and `selected` picked.
    async fn new(catalog: Catalog, selected: &[&str]) -> Self {
        let download_dir = TempDir::new().expect("Failed to create temp dir");
        let fetcher = MockFetcher::new();
        let installer = MockInstaller::new();

        let mut state = SelectionState::new("64-bit", true);
        for name in selected {
            state.set_selected(name, true);
        }

        let (orchestrator, events) = Orchestrator::new(
            OrchestratorConfig::default().with_download_dir(download_dir.path()),
            Arc::new(catalog),
            Arc::new(RwLock::new(state)),
            Arc::new(fetcher.clone()),
            Arc::new(installer.clone()),
        );

        Self {
            orchestrator,
            events,
            fetcher,
            installer,
            download_dir,
        }
    }

    fn drain(&mut self) -> Vec<OrchestratorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

fn with_arguments(name: &str, arguments: &str) -> ProgramEntry {
    let mut targets = BTreeMap::new();
    targets.insert("64-bit".to_string(), format!("http://x/{}-64-bit", name));
    ProgramEntry::new(name, targets, Some(arguments.to_string()), ["tools"]).unwrap()
}

fn program_messages(events: &[OrchestratorEvent], program: &str) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            OrchestratorEvent::Status {
                program: Some(p),
                message,
            } if p == program => Some(message.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_install_runs_downloaded_file_with_arguments() {
    let catalog = Catalog::from_entries(vec![
        with_arguments("Git", "/VERYSILENT /NORESTART"),
        fixtures::program_64("7-Zip"),
    ]);
    let mut harness = TestHarness::new(catalog, &["Git", "7-Zip"]).await;

    let summary = harness.orchestrator.run_selected().await.unwrap();
    let events = harness.drain();

    assert_eq!(summary.completed(), 2);
    assert!(summary.install_after_download);

    let runs = harness.installer.recorded_runs().await;
    assert_eq!(runs.len(), 2);

    let git = runs
        .iter()
        .find(|r| r.executable == destination_path(harness.download_dir.path(), "Git", "64-bit"))
        .unwrap();
    assert_eq!(git.arguments.as_deref(), Some("/VERYSILENT /NORESTART"));

    let zip = runs
        .iter()
        .find(|r| r.executable.ends_with("7-Zip_64-bit.exe"))
        .unwrap();
    assert_eq!(zip.arguments, None);

    assert_eq!(
        events.last(),
        Some(&OrchestratorEvent::Status {
            program: None,
            message: INSTALLATION_COMPLETE.to_string(),
        })
    );
}

#[tokio::test]
async fn test_pipeline_events_are_ordered() {
    let mut harness = TestHarness::new(fixtures::catalog_64(&["Git"]), &["Git"]).await;
    harness
        .installer
        .set_run_duration(Duration::from_millis(10))
        .await;

    harness.orchestrator.run_selected().await.unwrap();
    let messages = program_messages(&harness.drain(), "Git");

    assert_eq!(messages.first().map(String::as_str), Some("Downloading Git..."));
    let installing = messages.iter().position(|m| m == "Installing Git...").unwrap();
    let installed = messages.iter().position(|m| m == "Git installed.").unwrap();
    let last_download = messages
        .iter()
        .rposition(|m| m.starts_with("Downloading Git"))
        .unwrap();

    assert!(last_download < installing);
    assert!(installing < installed);
    assert_eq!(messages.last().map(String::as_str), Some("Completed Git"));
}

#[tokio::test]
async fn test_nonzero_exit_fails_pipeline() {
    let mut harness = TestHarness::new(fixtures::catalog_64(&["Git"]), &["Git"]).await;
    harness.installer.set_exit_code(1603).await;

    let summary = harness.orchestrator.run_selected().await.unwrap();
    let events = harness.drain();

    assert!(matches!(
        summary.outcome("Git"),
        Some(PipelineOutcome::Failed {
            error: PipelineError::InstallerExit {
                code: Some(1603),
                ..
            }
        })
    ));

    let messages = program_messages(&events, "Git");
    assert!(!messages.iter().any(|m| m == "Git installed."));
    assert_eq!(
        messages.last().map(String::as_str),
        Some("[Error] Git installer exited with code 1603")
    );
    assert!(matches!(
        events.last(),
        Some(OrchestratorEvent::Status { program: None, message }) if message == INSTALLATION_COMPLETE
    ));
}

#[tokio::test]
async fn test_launch_failure_is_isolated() {
    let catalog = fixtures::catalog_64(&["Git", "VLC"]);
    let mut harness = TestHarness::new(catalog, &["Git", "VLC"]).await;
    harness
        .installer
        .fail_executable("Git_64-bit.exe", MockRunFailure::Launch)
        .await;

    let summary = harness.orchestrator.run_selected().await.unwrap();
    harness.drain();

    assert!(matches!(
        summary.outcome("Git"),
        Some(PipelineOutcome::Failed {
            error: PipelineError::Install {
                source: RunError::Launch { .. },
                ..
            }
        })
    ));
    assert!(summary.outcome("VLC").unwrap().is_completed());
}

#[tokio::test]
async fn test_failed_download_is_never_installed() {
    let mut harness = TestHarness::new(fixtures::catalog_64(&["Git", "VLC"]), &["Git", "VLC"]).await;
    harness
        .fetcher
        .fail_source("http://x/Git-64-bit", MockFetchFailure::Network)
        .await;

    let summary = harness.orchestrator.run_selected().await.unwrap();
    let events = harness.drain();

    assert!(summary.outcome("Git").unwrap().is_failed());
    let runs = harness.installer.recorded_runs().await;
    assert_eq!(runs.len(), 1);
    assert!(runs[0].executable.ends_with("VLC_64-bit.exe"));
    assert!(!program_messages(&events, "Git")
        .iter()
        .any(|m| m.starts_with("Installing")));
}

#[tokio::test]
async fn test_already_downloaded_program_is_not_reinstalled() {
    let mut harness = TestHarness::new(fixtures::catalog_64(&["Git"]), &["Git"]).await;
    std::fs::write(
        destination_path(harness.download_dir.path(), "Git", "64-bit"),
        b"MZ",
    )
    .unwrap();

    let summary = harness.orchestrator.run_selected().await.unwrap();
    let events = harness.drain();

    assert!(summary.outcome("Git").unwrap().is_skipped());
    assert_eq!(harness.fetcher.fetch_count().await, 0);
    assert_eq!(harness.installer.run_count().await, 0);
    assert!(matches!(
        events.last(),
        Some(OrchestratorEvent::Status { program: None, message }) if message == INSTALLATION_COMPLETE
    ));
}
