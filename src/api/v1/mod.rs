//! Public v1 API: the host pipeline entry point

pub mod exposure;

use axum::{routing::post, Router};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new().route("/exposure", post(exposure::evaluate_exposure))
}
