//! Orchestrator implementation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{Catalog, ProgramEntry};
use crate::fetcher::{Fetcher, ProgressCallback, ProgressTracker};
use crate::installer::InstallerRunner;
use crate::selection::SelectionState;

use super::config::OrchestratorConfig;
use super::events::{event_channel, EventSink, EventStream};
use super::types::{
    OrchestratorError, PipelineError, PipelineOutcome, ProgramOutcome, RunSummary,
    DOWNLOAD_COMPLETE, INSTALLATION_COMPLETE, NO_PROGRAMS_SELECTED,
};

/// Maximum number of pipelines running at the same time.
pub const MAX_CONCURRENT_PIPELINES: usize = 3;

/// Deterministic download location for a program/architecture pair.
pub fn destination_path(download_dir: &Path, program: &str, architecture: &str) -> PathBuf {
    download_dir.join(format!(
        "{}_{}.exe",
        sanitize_component(program),
        sanitize_component(architecture)
    ))
}

fn sanitize_component(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Exclusive claim on an orchestrator's single run slot.
///
/// Obtained from [`Orchestrator::try_claim`] and passed to
/// [`Orchestrator::run_claimed`]. The slot stays taken until the guard is
/// dropped, whether or not a run happened under it.
#[derive(Debug)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Shared completion counter for one run.
struct RunProgress {
    total: usize,
    completed: AtomicUsize,
    /// Keeps increment and publish together so percentages never go back.
    publish: Mutex<()>,
    events: EventSink,
}

impl RunProgress {
    fn new(total: usize, events: EventSink) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            publish: Mutex::new(()),
            events,
        }
    }

    /// Counts one terminal pipeline and publishes the new percentage.
    fn complete_one(&self) -> usize {
        let _publishing = self.publish.lock().unwrap_or_else(PoisonError::into_inner);
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        let percent = (completed.min(self.total) * 100 / self.total) as u8;
        self.events.progress(percent);
        completed
    }
}

/// Per-run inputs shared by all pipeline tasks.
struct PipelineContext {
    architecture: String,
    install_after_download: bool,
    download_dir: PathBuf,
    fetcher: Arc<dyn Fetcher>,
    installer: Arc<dyn InstallerRunner>,
    events: EventSink,
}

impl PipelineContext {
    fn fail(&self, error: PipelineError) -> PipelineOutcome {
        let program = match &error {
            PipelineError::ArchitectureUnavailable { program, .. }
            | PipelineError::Download { program, .. }
            | PipelineError::Install { program, .. }
            | PipelineError::InstallerExit { program, .. }
            | PipelineError::Interrupted { program, .. } => program.clone(),
        };
        warn!(program = %program, kind = error.kind(), "{}", error);
        self.events.program_status(&program, format!("[Error] {}", error));
        PipelineOutcome::Failed { error }
    }

    /// Download, then optionally install, one program.
    async fn run(&self, entry: &ProgramEntry) -> PipelineOutcome {
        let name = entry.name();

        let Some(source) = entry.source_for(&self.architecture) else {
            return self.fail(PipelineError::ArchitectureUnavailable {
                program: name.to_string(),
                architecture: self.architecture.clone(),
            });
        };

        let destination = destination_path(&self.download_dir, name, &self.architecture);

        match tokio::fs::try_exists(&destination).await {
            Ok(true) => {
                debug!("{:?} already present, skipping {}", destination, name);
                self.events
                    .program_status(name, format!("Skipped {}: already downloaded", name));
                return PipelineOutcome::Skipped {
                    reason: format!("{} already exists", destination.display()),
                };
            }
            Ok(false) => {}
            Err(e) => warn!("Could not check {:?}: {}", destination, e),
        }

        self.events
            .program_status(name, format!("Downloading {}...", name));

        let on_progress: ProgressCallback = {
            let tracker = ProgressTracker::new();
            let events = self.events.clone();
            let program = name.to_string();
            Arc::new(move |percent| {
                if tracker.advance(percent) {
                    events.program_status(
                        &program,
                        format!("Downloading {}: {}%", program, percent),
                    );
                }
            })
        };

        match self.fetcher.fetch(source, &destination, on_progress).await {
            Ok(bytes) => debug!("Downloaded {} ({} bytes)", name, bytes),
            Err(source) => {
                return self.fail(PipelineError::Download {
                    program: name.to_string(),
                    source,
                })
            }
        }

        if self.install_after_download {
            self.events
                .program_status(name, format!("Installing {}...", name));

            match self.installer.run(&destination, entry.arguments()).await {
                Ok(exit) if exit.success() => {
                    self.events.program_status(name, format!("{} installed.", name));
                }
                Ok(exit) => {
                    return self.fail(PipelineError::InstallerExit {
                        program: name.to_string(),
                        code: exit.code,
                    })
                }
                Err(source) => {
                    return self.fail(PipelineError::Install {
                        program: name.to_string(),
                        source,
                    })
                }
            }
        }

        self.events.program_status(name, format!("Completed {}", name));
        PipelineOutcome::Completed
    }
}

/// Drives download/install pipelines for the selected programs.
pub struct Orchestrator {
    config: OrchestratorConfig,
    catalog: Arc<Catalog>,
    selection: Arc<RwLock<SelectionState>>,
    fetcher: Arc<dyn Fetcher>,
    installer: Arc<dyn InstallerRunner>,
    events: EventSink,
    slots: Arc<Semaphore>,
    running: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Creates an orchestrator and the stream its events are published on.
    pub fn new(
        config: OrchestratorConfig,
        catalog: Arc<Catalog>,
        selection: Arc<RwLock<SelectionState>>,
        fetcher: Arc<dyn Fetcher>,
        installer: Arc<dyn InstallerRunner>,
    ) -> (Self, EventStream) {
        let (events, stream) = event_channel();

        let orchestrator = Self {
            config,
            catalog,
            selection,
            fetcher,
            installer,
            events,
            slots: Arc::new(Semaphore::new(MAX_CONCURRENT_PIPELINES)),
            running: Arc::new(AtomicBool::new(false)),
        };

        (orchestrator, stream)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn selection(&self) -> &Arc<RwLock<SelectionState>> {
        &self.selection
    }

    /// Producer side of the event stream, for status messages that do not
    /// come from a run (e.g. catalog load errors).
    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claims the run slot without starting anything.
    ///
    /// Lets a caller reject an overlapping request synchronously and start
    /// the run later (e.g. on a spawned task) with [`Self::run_claimed`].
    pub fn try_claim(&self) -> Result<RunGuard, OrchestratorError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| RunGuard {
                running: Arc::clone(&self.running),
            })
            .map_err(|_| OrchestratorError::RunInProgress)
    }

    /// Downloads (and optionally installs) every selected program.
    ///
    /// Per-program failures are reported on the event stream and in the
    /// summary; they never fail the run. Returns
    /// [`OrchestratorError::RunInProgress`] if another run is active.
    pub async fn run_selected(&self) -> Result<RunSummary, OrchestratorError> {
        let claim = self.try_claim()?;
        self.run_claimed(&claim).await
    }

    /// Runs with a slot already claimed by [`Self::try_claim`].
    ///
    /// The caller keeps the claim, so it can finish its own bookkeeping
    /// before another run may start. Fails with
    /// [`OrchestratorError::ForeignClaim`] if `claim` came from another
    /// orchestrator.
    pub async fn run_claimed(&self, claim: &RunGuard) -> Result<RunSummary, OrchestratorError> {
        if !Arc::ptr_eq(&claim.running, &self.running) {
            return Err(OrchestratorError::ForeignClaim);
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let request = self.selection.read().await.snapshot(&self.catalog);

        if request.entries.is_empty() {
            info!(%run_id, "Run requested with no programs selected");
            self.events.status(NO_PROGRAMS_SELECTED);
            return Ok(RunSummary {
                run_id,
                started_at,
                finished_at: Utc::now(),
                install_after_download: request.install_after_download,
                outcomes: Vec::new(),
            });
        }

        let total = request.entries.len();
        info!(
            %run_id,
            "Starting run: {} programs, architecture {}, install after download: {}",
            total,
            request.architecture,
            request.install_after_download
        );

        let progress = Arc::new(RunProgress::new(total, self.events.clone()));
        self.events.progress(0);

        let context = Arc::new(PipelineContext {
            architecture: request.architecture.clone(),
            install_after_download: request.install_after_download,
            download_dir: self.config.download_dir.clone(),
            fetcher: Arc::clone(&self.fetcher),
            installer: Arc::clone(&self.installer),
            events: self.events.clone(),
        });

        let handles: Vec<_> = request
            .entries
            .into_iter()
            .map(|entry| {
                let program = entry.name().to_string();
                let context = Arc::clone(&context);
                let slots = Arc::clone(&self.slots);
                let progress = Arc::clone(&progress);

                let handle = tokio::spawn(async move {
                    let outcome = match slots.acquire_owned().await {
                        Ok(_permit) => context.run(&entry).await,
                        Err(_) => context.fail(PipelineError::Interrupted {
                            program: entry.name().to_string(),
                            reason: "worker pool closed".to_string(),
                        }),
                    };
                    progress.complete_one();
                    outcome
                });

                (program, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(total);
        for (program, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let outcome = context.fail(PipelineError::Interrupted {
                        program: program.clone(),
                        reason: e.to_string(),
                    });
                    progress.complete_one();
                    outcome
                }
            };
            outcomes.push(ProgramOutcome { program, outcome });
        }

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            install_after_download: request.install_after_download,
            outcomes,
        };

        info!(
            %run_id,
            "Run finished: {} completed, {} skipped, {} failed",
            summary.completed(),
            summary.skipped(),
            summary.failed()
        );

        self.events.status(if request.install_after_download {
            INSTALLATION_COMPLETE
        } else {
            DOWNLOAD_COMPLETE
        });

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_path_is_deterministic() {
        let dir = Path::new("/downloads");
        assert_eq!(
            destination_path(dir, "Firefox", "64-bit"),
            PathBuf::from("/downloads/Firefox_64-bit.exe")
        );
        assert_eq!(
            destination_path(dir, "Firefox", "64-bit"),
            destination_path(dir, "Firefox", "64-bit")
        );
        assert_ne!(
            destination_path(dir, "Firefox", "64-bit"),
            destination_path(dir, "Firefox", "32-bit")
        );
    }

    #[test]
    fn test_destination_path_stays_in_download_dir() {
        let path = destination_path(Path::new("/downloads"), "../evil/app", "x86:64");
        assert_eq!(path, PathBuf::from("/downloads/.._evil_app_x86_64.exe"));
        assert_eq!(path.parent(), Some(Path::new("/downloads")));
    }

    fn orchestrator() -> Orchestrator {
        use crate::testing::{MockFetcher, MockInstaller};

        let (orchestrator, _events) = Orchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(Catalog::empty()),
            Arc::new(RwLock::new(SelectionState::default())),
            Arc::new(MockFetcher::new()),
            Arc::new(MockInstaller::new()),
        );
        orchestrator
    }

    #[test]
    fn test_claim_is_exclusive_until_dropped() {
        let orchestrator = orchestrator();

        let claim = orchestrator.try_claim().unwrap();
        assert!(orchestrator.is_running());
        assert!(matches!(
            orchestrator.try_claim(),
            Err(OrchestratorError::RunInProgress)
        ));

        drop(claim);
        assert!(!orchestrator.is_running());
        assert!(orchestrator.try_claim().is_ok());
    }

    #[tokio::test]
    async fn test_slot_stays_claimed_until_caller_drops_it() {
        let orchestrator = orchestrator();

        let claim = orchestrator.try_claim().unwrap();
        assert!(matches!(
            orchestrator.run_selected().await,
            Err(OrchestratorError::RunInProgress)
        ));

        let summary = orchestrator.run_claimed(&claim).await.unwrap();
        assert_eq!(summary.total(), 0);
        assert!(orchestrator.is_running());

        drop(claim);
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_claim_from_other_orchestrator_is_refused() {
        let first = orchestrator();
        let second = orchestrator();

        let claim = first.try_claim().unwrap();
        assert!(matches!(
            second.run_claimed(&claim).await,
            Err(OrchestratorError::ForeignClaim)
        ));
        assert!(first.is_running());
        assert!(!second.is_running());
    }

    #[test]
    fn test_run_progress_is_monotonic_and_capped() {
        let (events, mut stream) = event_channel();
        let progress = RunProgress::new(3, events);
        assert_eq!(progress.complete_one(), 1);
        assert_eq!(progress.complete_one(), 2);
        assert_eq!(progress.complete_one(), 3);

        let mut percents = Vec::new();
        while let Ok(event) = stream.try_recv() {
            if let crate::orchestrator::OrchestratorEvent::Progress { percent } = event {
                percents.push(percent);
            }
        }
        assert_eq!(percents, vec![33, 66, 100]);
    }
}
