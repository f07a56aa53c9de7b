//! Admin API endpoints for managing experiments and content

pub mod experiments;
pub mod exposures;
pub mod items;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        // Experiments
        .route(
            "/experiments",
            get(experiments::list_experiments).post(experiments::create_experiment),
        )
        .route("/experiments/{experiment_id}", get(experiments::get_experiment))
        .route(
            "/experiments/{experiment_id}/start",
            post(experiments::start_experiment),
        )
        .route(
            "/experiments/{experiment_id}/suspend",
            post(experiments::suspend_experiment),
        )
        .route(
            "/experiments/{experiment_id}/resume",
            post(experiments::resume_experiment),
        )
        .route(
            "/experiments/{experiment_id}/complete",
            post(experiments::complete_experiment),
        )
        // Content items
        .route("/items", get(items::list_items).post(items::create_item))
        // Exposure log
        .route("/exposures", get(exposures::list_exposures))
}
