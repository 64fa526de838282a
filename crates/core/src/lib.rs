pub mod catalog;
pub mod config;
pub mod fetcher;
pub mod installer;
pub mod orchestrator;
pub mod selection;
pub mod testing;

pub use catalog::{
    load_catalog, load_catalog_or_empty, parse_catalog, Catalog, CatalogError, CatalogLoad,
    ProgramEntry, ALL_TAG,
};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, CatalogConfig,
    Config, ConfigError, SelectionDefaults, ServerConfig,
};
pub use fetcher::{FetchError, Fetcher, FetcherConfig, HttpFetcher, ProgressCallback};
pub use installer::{InstallerExit, InstallerRunner, ProcessRunner, RunError};
pub use orchestrator::{
    EventSink, EventStream, Orchestrator, OrchestratorConfig, OrchestratorError,
    OrchestratorEvent, PipelineError, PipelineOutcome, RunGuard, RunSummary,
    MAX_CONCURRENT_PIPELINES,
};
pub use selection::{RunRequest, SelectionState, DEFAULT_ARCHITECTURE};
