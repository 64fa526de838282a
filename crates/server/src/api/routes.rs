use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, install, middleware::metrics_middleware, programs, settings, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Catalog and selection
        .route("/programs", get(programs::list_programs))
        .route("/programs/{name}/selection", put(programs::set_selection))
        .route("/selection/all", post(programs::select_all))
        .route("/tags", get(programs::list_tags))
        .route("/architectures", get(programs::list_architectures))
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        // Runs
        .route("/install", post(install::start_install))
        .route("/status", get(install::get_status))
        .route("/ws", get(ws::ws_handler))
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
