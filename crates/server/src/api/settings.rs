//! Run settings: architecture, active tag, search query and install toggle.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use quickinstall_core::SelectionState;

use super::handlers::error_response;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub architecture: String,
    pub tag: String,
    pub search_query: String,
    pub install_after_download: bool,
    pub selected_count: usize,
}

impl From<&SelectionState> for SettingsResponse {
    fn from(selection: &SelectionState) -> Self {
        Self {
            architecture: selection.architecture().to_string(),
            tag: selection.tag().to_string(),
            search_query: selection.search_query().to_string(),
            install_after_download: selection.install_after_download(),
            selected_count: selection.selected_count(),
        }
    }
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub architecture: Option<String>,
    pub tag: Option<String>,
    pub search_query: Option<String>,
    pub install_after_download: Option<bool>,
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    let selection = state.selection().read().await;
    Json(SettingsResponse::from(&*selection))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, impl IntoResponse> {
    if let Some(architecture) = &request.architecture {
        if !state.catalog().architectures().contains(architecture) {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("Unknown architecture: {}", architecture),
            ));
        }
    }

    let mut selection = state.selection().write().await;

    if let Some(architecture) = request.architecture {
        info!("Architecture set to {}", architecture);
        selection.set_architecture(architecture);
    }
    if let Some(tag) = request.tag {
        selection.set_tag(&tag);
    }
    if let Some(query) = request.search_query {
        selection.set_search_query(query);
    }
    if let Some(enabled) = request.install_after_download {
        selection.set_install_after_download(enabled);
    }

    Ok(Json(SettingsResponse::from(&*selection)))
}
