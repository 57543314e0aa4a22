pub mod health;
pub mod ui;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let single_limit = state.config.max_upload_bytes;
    let bulk_limit = state.config.bulk_body_limit();

    Router::new()
        .route("/", get(ui::index_handler))
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            delete(handlers::handle_delete_session),
        )
        // Analysis
        .route(
            "/api/v1/sessions/:id/analyze",
            post(handlers::handle_analyze).layer(DefaultBodyLimit::max(single_limit)),
        )
        .route(
            "/api/v1/sessions/:id/rank",
            post(handlers::handle_rank).layer(DefaultBodyLimit::max(bulk_limit)),
        )
        // Exports
        .route(
            "/api/v1/sessions/:id/report.md",
            get(handlers::handle_export_markdown),
        )
        .route(
            "/api/v1/sessions/:id/rankings.csv",
            get(handlers::handle_export_csv),
        )
        .with_state(state)
}
