//! Orchestrator - runs the download/install pipeline for selected programs.
//!
//! For every selected program a pipeline task is spawned:
//! resolve source -> skip if already downloaded -> fetch -> optionally install.
//! At most [`MAX_CONCURRENT_PIPELINES`] pipelines run at once. Progress and
//! status events from all pipelines are sent over a single channel that the
//! presentation layer drains.
//!
//! # Example
//!
//! ```ignore
//! let (orchestrator, mut events) = Orchestrator::new(
//!     OrchestratorConfig::default(),
//!     Arc::new(catalog),
//!     Arc::new(RwLock::new(SelectionState::default())),
//!     Arc::new(HttpFetcher::with_defaults()?),
//!     Arc::new(ProcessRunner::new()),
//! );
//!
//! tokio::spawn(async move {
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//! });
//!
//! let summary = orchestrator.run_selected().await?;
//! println!("{} failed", summary.failed());
//! ```

mod config;
mod events;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use events::{event_channel, EventSink, EventStream};
pub use runner::{destination_path, Orchestrator, RunGuard, MAX_CONCURRENT_PIPELINES};
pub use types::{
    OrchestratorError, OrchestratorEvent, PipelineError, PipelineOutcome, ProgramOutcome,
    RunSummary, DOWNLOAD_COMPLETE, INSTALLATION_COMPLETE, NO_PROGRAMS_SELECTED,
};
