//! Orchestrator types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::fetcher::FetchError;
use crate::installer::RunError;

/// Terminal status when a run is triggered with nothing selected.
pub const NO_PROGRAMS_SELECTED: &str = "No programs selected";
/// Terminal status of a download-only run.
pub const DOWNLOAD_COMPLETE: &str = "Download complete.";
/// Terminal status of a run with install-after-download enabled.
pub const INSTALLATION_COMPLETE: &str = "Installation complete.";

/// Event published to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    /// Overall progress of the current run (0-100).
    Progress { percent: u8 },
    /// Human-readable status line.
    Status {
        #[serde(skip_serializing_if = "Option::is_none")]
        program: Option<String>,
        message: String,
    },
}

/// Errors returned by the orchestrator itself.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A run is already in flight.
    #[error("An installation run is already in progress")]
    RunInProgress,

    /// A run claim was handed to an orchestrator that did not issue it.
    #[error("Run claim belongs to a different orchestrator")]
    ForeignClaim,
}

/// Why a single pipeline failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The program has no download for the selected architecture.
    #[error("Architecture {architecture} not available for {program}.")]
    ArchitectureUnavailable {
        program: String,
        architecture: String,
    },

    /// The transfer failed.
    #[error("Failed to download {program}: {source}")]
    Download {
        program: String,
        #[source]
        source: FetchError,
    },

    /// The installer could not be run.
    #[error("Failed to install {program}: {source}")]
    Install {
        program: String,
        #[source]
        source: RunError,
    },

    /// The installer ran but reported failure.
    #[error("{program} installer exited with {}", exit_description(.code))]
    InstallerExit { program: String, code: Option<i32> },

    /// The pipeline task did not run to completion.
    #[error("Pipeline for {program} was interrupted: {reason}")]
    Interrupted { program: String, reason: String },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code".to_string(),
    }
}

impl PipelineError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArchitectureUnavailable { .. } => "architecture_unavailable",
            Self::Download { source, .. } if source.is_network() => "network",
            Self::Download { .. } => "io",
            Self::Install { source: RunError::NotFound { .. }, .. } => "installer_not_found",
            Self::Install { .. } => "launch",
            Self::InstallerExit { .. } => "installer_exit",
            Self::Interrupted { .. } => "interrupted",
        }
    }
}

/// Terminal state of one pipeline.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Downloaded, and installed when requested.
    Completed,
    /// Nothing to do, e.g. the installer was already downloaded.
    Skipped { reason: String },
    /// Failed without affecting the rest of the run.
    Failed { error: PipelineError },
}

impl PipelineOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Outcome for one program of a run.
#[derive(Debug)]
pub struct ProgramOutcome {
    pub program: String,
    pub outcome: PipelineOutcome,
}

/// Result of one `run_selected` call.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub install_after_download: bool,
    /// Outcomes in catalog order.
    pub outcomes: Vec<ProgramOutcome>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_completed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_failed()).count()
    }

    /// Outcome for a given program, if it was part of the run.
    pub fn outcome(&self, program: &str) -> Option<&PipelineOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.program == program)
            .map(|o| &o.outcome)
    }
}
