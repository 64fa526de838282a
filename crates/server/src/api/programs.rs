//! Catalog browsing and selection handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use quickinstall_core::{ProgramEntry, SelectionState};

use super::handlers::error_response;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// A catalog entry as shown to the user.
#[derive(Debug, Serialize)]
pub struct ProgramView {
    pub name: String,
    pub architectures: Vec<String>,
    pub tags: Vec<String>,
    pub selected: bool,
    /// Whether the entry has a download for the selected architecture.
    pub available: bool,
}

impl ProgramView {
    fn new(entry: &ProgramEntry, selection: &SelectionState) -> Self {
        Self {
            name: entry.name().to_string(),
            architectures: entry.architectures().keys().cloned().collect(),
            tags: entry.tags().iter().cloned().collect(),
            selected: selection.is_selected(entry.name()),
            available: entry.source_for(selection.architecture()).is_some(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgramListResponse {
    pub tag: String,
    pub search_query: String,
    pub programs: Vec<ProgramView>,
    pub selected_count: usize,
    pub all_selected_in_tag: bool,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ArchitecturesResponse {
    pub architectures: Vec<String>,
    pub selected: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub name: String,
    pub selected: bool,
    pub selected_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SelectAllResponse {
    pub tag: String,
    pub selected_count: usize,
    pub all_selected_in_tag: bool,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetSelectionRequest {
    pub selected: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Entries visible under the active tag and search query.
pub async fn list_programs(State(state): State<Arc<AppState>>) -> Json<ProgramListResponse> {
    let catalog = state.catalog();
    let selection = state.selection().read().await;

    let programs = selection
        .visible_entries(catalog)
        .into_iter()
        .map(|entry| ProgramView::new(entry, &selection))
        .collect();

    Json(ProgramListResponse {
        tag: selection.tag().to_string(),
        search_query: selection.search_query().to_string(),
        programs,
        selected_count: selection.selected_count(),
        all_selected_in_tag: selection.all_selected_in_tag(catalog),
    })
}

pub async fn list_tags(State(state): State<Arc<AppState>>) -> Json<TagsResponse> {
    Json(TagsResponse {
        tags: state.catalog().tags().iter().cloned().collect(),
    })
}

pub async fn list_architectures(State(state): State<Arc<AppState>>) -> Json<ArchitecturesResponse> {
    let selected = state.selection().read().await.architecture().to_string();
    Json(ArchitecturesResponse {
        architectures: state.catalog().architectures().into_iter().collect(),
        selected,
    })
}

/// Select or deselect one program by name.
pub async fn set_selection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<SetSelectionRequest>,
) -> Result<Json<SelectionResponse>, impl IntoResponse> {
    if state.catalog().get(&name).is_none() {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Unknown program: {}", name),
        ));
    }

    let mut selection = state.selection().write().await;
    selection.set_selected(&name, request.selected);

    Ok(Json(SelectionResponse {
        selected: selection.is_selected(&name),
        selected_count: selection.selected_count(),
        name,
    }))
}

/// Select or deselect every program in the active tag.
pub async fn select_all(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetSelectionRequest>,
) -> Json<SelectAllResponse> {
    let catalog = state.catalog();
    let mut selection = state.selection().write().await;
    selection.set_all_in_tag(catalog, request.selected);

    Json(SelectAllResponse {
        tag: selection.tag().to_string(),
        selected_count: selection.selected_count(),
        all_selected_in_tag: selection.all_selected_in_tag(catalog),
    })
}
