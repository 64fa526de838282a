//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the QuickInstall server:
//! - HTTP request metrics (latency, counts)
//! - WebSocket connection metrics
//! - Run and pipeline outcome metrics
//! - Catalog and selection gauges (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};
use quickinstall_core::{PipelineOutcome, RunSummary};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "quickinstall_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quickinstall_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "quickinstall_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "quickinstall_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "quickinstall_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "quickinstall_ws_messages_sent_total",
            "WebSocket messages sent",
        ),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "quickinstall_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Run Metrics
// =============================================================================

/// Install requests by result ("accepted", "rejected").
pub static RUN_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quickinstall_run_requests_total", "Install requests"),
        &["result"],
    )
    .unwrap()
});

/// Finished runs.
pub static RUNS_COMPLETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "quickinstall_runs_completed_total",
        "Runs that reached their terminal status",
    )
    .unwrap()
});

/// Wall-clock duration of finished runs.
pub static RUN_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "quickinstall_run_duration_seconds",
            "Duration of a run from trigger to terminal status",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
    )
    .unwrap()
});

/// Pipeline terminal states.
pub static PIPELINE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "quickinstall_pipeline_outcomes_total",
            "Pipelines by terminal state",
        ),
        &["outcome"],
    )
    .unwrap()
});

/// Failed pipelines by failure kind.
pub static PIPELINE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "quickinstall_pipeline_failures_total",
            "Failed pipelines by failure kind",
        ),
        &["kind"],
    )
    .unwrap()
});

/// Whether a run is in flight (collected dynamically).
pub static RUN_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "quickinstall_run_active",
        "Whether a run is in flight (1) or not (0)",
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics (collected dynamically)
// =============================================================================

/// Programs in the catalog.
pub static CATALOG_PROGRAMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "quickinstall_catalog_programs",
        "Number of programs in the catalog",
    )
    .unwrap()
});

/// Programs currently selected.
pub static SELECTED_PROGRAMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "quickinstall_selected_programs",
        "Number of programs currently selected",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Runs
    registry
        .register(Box::new(RUN_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(RUNS_COMPLETED_TOTAL.clone()))
        .unwrap();
    registry.register(Box::new(RUN_DURATION.clone())).unwrap();
    registry
        .register(Box::new(PIPELINE_OUTCOMES.clone()))
        .unwrap();
    registry
        .register(Box::new(PIPELINE_FAILURES.clone()))
        .unwrap();
    registry.register(Box::new(RUN_ACTIVE.clone())).unwrap();

    // Catalog
    registry
        .register(Box::new(CATALOG_PROGRAMS.clone()))
        .unwrap();
    registry
        .register(Box::new(SELECTED_PROGRAMS.clone()))
        .unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Record the outcome counters of a finished run.
pub fn record_run(summary: &RunSummary) {
    RUNS_COMPLETED_TOTAL.inc();
    let elapsed = summary.finished_at - summary.started_at;
    RUN_DURATION.observe(elapsed.num_milliseconds().max(0) as f64 / 1000.0);

    for outcome in &summary.outcomes {
        PIPELINE_OUTCOMES
            .with_label_values(&[outcome.outcome.label()])
            .inc();
        if let PipelineOutcome::Failed { error } = &outcome.outcome {
            PIPELINE_FAILURES.with_label_values(&[error.kind()]).inc();
        }
    }
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the current values.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    RUN_ACTIVE.set(i64::from(state.orchestrator().is_running()));
    CATALOG_PROGRAMS.set(state.catalog().len() as i64);
    SELECTED_PROGRAMS.set(state.selection().read().await.selected_count() as i64);
}

/// Normalize a path for metric labels (replace program names with a placeholder).
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').collect();
    for i in 1..segments.len() {
        if segments[i - 1] == "programs" && !segments[i].is_empty() {
            segments[i] = "{name}";
        }
    }
    segments.join("/")
}
