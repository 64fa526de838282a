//! Run trigger and status handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use super::handlers::error_response;
use crate::metrics::{record_run, RUN_REQUESTS_TOTAL};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct InstallAcceptedResponse {
    pub message: String,
    pub selected_count: usize,
    pub install_after_download: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub progress: Option<u8>,
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Start a run over the current selection in the background.
///
/// Returns 202 immediately; progress arrives on `/ws` and `/status`.
pub async fn start_install(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<InstallAcceptedResponse>), impl IntoResponse> {
    // Claimed before responding so an overlapping request gets 409, not 202
    let claim = match state.orchestrator().try_claim() {
        Ok(claim) => claim,
        Err(e) => {
            RUN_REQUESTS_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(error_response(StatusCode::CONFLICT, e.to_string()));
        }
    };

    let (selected_count, install_after_download) = {
        let selection = state.selection().read().await;
        (
            selection.selected_entries(state.catalog()).len(),
            selection.install_after_download(),
        )
    };

    RUN_REQUESTS_TOTAL.with_label_values(&["accepted"]).inc();
    info!("Install requested for {} programs", selected_count);

    state.run_states().announce(true);
    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        match task_state.orchestrator().run_claimed(&claim).await {
            Ok(summary) => record_run(&summary),
            Err(e) => error!("Run could not start: {}", e),
        }
        task_state.run_states().announce(false);
        drop(claim);
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(InstallAcceptedResponse {
            message: "Run started".to_string(),
            selected_count,
            install_after_download,
        }),
    ))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.status().await;
    Json(StatusResponse {
        running: state.orchestrator().is_running(),
        progress: snapshot.progress,
        status: snapshot.status,
        program: snapshot.program,
        updated_at: snapshot.updated_at,
    })
}
