//! Exposure log admin endpoint

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::exposure::ExposureRecord;

const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListExposuresQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListExposuresResponse {
    pub exposures: Vec<ExposureRecord>,
    pub total: usize,
}

/// GET /admin/exposures, newest first
pub async fn list_exposures(
    State(state): State<AppState>,
    Query(params): Query<ListExposuresQuery>,
) -> Result<Json<ListExposuresResponse>, ApiError> {
    let exposures = state
        .tracker
        .recent(params.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    let total = exposures.len();

    Ok(Json(ListExposuresResponse { exposures, total }))
}
