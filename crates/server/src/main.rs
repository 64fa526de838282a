use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quickinstall_core::{
    load_catalog_or_empty, load_config_or_default, validate_config, Fetcher, HttpFetcher,
    InstallerRunner, Orchestrator, ProcessRunner, SelectionState,
};
use quickinstall_server::api::{create_router, WsBroadcaster};
use quickinstall_server::events::spawn_event_pump;
use quickinstall_server::state::{AppState, StatusSnapshot};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("QUICKINSTALL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Catalog path: {:?}", config.catalog.path);
    info!("Download directory: {:?}", config.orchestrator.download_dir);

    // Load the catalog; a broken catalog leaves the UI usable but empty
    let load = load_catalog_or_empty(&config.catalog.path);
    info!("Catalog holds {} programs", load.catalog.len());

    let fetcher: Arc<dyn Fetcher> = Arc::new(
        HttpFetcher::new(config.fetcher.clone()).context("Failed to create HTTP fetcher")?,
    );
    let installer: Arc<dyn InstallerRunner> = Arc::new(ProcessRunner::new());

    let selection = Arc::new(RwLock::new(SelectionState::new(
        config.selection.architecture.clone(),
        config.selection.install_after_download,
    )));

    let (orchestrator, events) = Orchestrator::new(
        config.orchestrator.clone(),
        Arc::new(load.catalog),
        selection,
        fetcher,
        installer,
    );
    let orchestrator = Arc::new(orchestrator);

    // Single consumer of the event stream
    let ws_broadcaster = WsBroadcaster::default();
    let status = Arc::new(RwLock::new(StatusSnapshot::default()));
    let (run_states, pump) =
        spawn_event_pump(events, Arc::clone(&status), ws_broadcaster.clone());

    if let Some(e) = load.error {
        warn!("Catalog unavailable: {}", e);
        orchestrator
            .events()
            .status(format!("[Error] Failed to load programs: {}", e));
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&orchestrator),
        status,
        run_states,
        ws_broadcaster,
    ));

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    if orchestrator.is_running() {
        warn!("Shutting down while a run is in progress; unfinished downloads stay as .part files");
    }

    // A run spawned by /install may still hold the event sink
    pump.abort();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
