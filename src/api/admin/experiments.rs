//! Experiment management admin endpoints

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::content::ItemId;
use crate::domain::experiment::{ExperimentDefinition, ExperimentQuery, ExperimentStatus};
use crate::infrastructure::services::CreateExperimentRequest;

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing experiments
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListExperimentsQuery {
    pub status: Option<String>,
    pub item_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// ============================================================================
// Response Types
// ============================================================================

/// Experiment response
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentResponse {
    pub id: String,
    pub name: String,
    pub status: ExperimentStatus,
    pub item_id: String,
    pub device_id: String,
    pub traffic_allocation: u8,
    pub variables: Vec<VariableResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_reason: Option<String>,
    pub started_at: Option<String>,
    pub suspended_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableResponse {
    pub id: String,
    pub name: String,
    pub values: Vec<ValueResponse>,
}

/// A value with the index combinations use to select it
#[derive(Debug, Clone, Serialize)]
pub struct ValueResponse {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub datasource: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListExperimentsResponse {
    pub experiments: Vec<ExperimentResponse>,
    pub total: usize,
}

impl From<&ExperimentDefinition> for ExperimentResponse {
    fn from(experiment: &ExperimentDefinition) -> Self {
        Self {
            id: experiment.id().as_str().to_string(),
            name: experiment.name().to_string(),
            status: experiment.status(),
            item_id: experiment.item_id().as_str().to_string(),
            device_id: experiment.device_id().as_str().to_string(),
            traffic_allocation: experiment.traffic_allocation(),
            variables: experiment
                .variables()
                .iter()
                .map(|variable| VariableResponse {
                    id: variable.id().to_string(),
                    name: variable.name().to_string(),
                    values: variable
                        .values()
                        .iter()
                        .enumerate()
                        .map(|(index, value)| ValueResponse {
                            index,
                            id: value.id().to_string(),
                            name: value.name().to_string(),
                            datasource: value.datasource().map(|d| d.as_str().to_string()),
                        })
                        .collect(),
                })
                .collect(),
            suspend_reason: experiment.suspend_reason().map(|r| r.to_string()),
            started_at: experiment.started_at().map(|t| t.to_rfc3339()),
            suspended_at: experiment.suspended_at().map(|t| t.to_rfc3339()),
            created_at: experiment.created_at().to_rfc3339(),
            updated_at: experiment.updated_at().to_rfc3339(),
        }
    }
}

fn parse_status(s: &str) -> Result<ExperimentStatus, ApiError> {
    match s.to_lowercase().as_str() {
        "draft" => Ok(ExperimentStatus::Draft),
        "running" => Ok(ExperimentStatus::Running),
        "suspended" => Ok(ExperimentStatus::Suspended),
        "completed" => Ok(ExperimentStatus::Completed),
        other => Err(ApiError::bad_request(format!(
            "Invalid status '{}'. Valid values: draft, running, suspended, completed",
            other
        ))
        .with_param("status")),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /admin/experiments
pub async fn list_experiments(
    State(state): State<AppState>,
    Query(params): Query<ListExperimentsQuery>,
) -> Result<Json<ListExperimentsResponse>, ApiError> {
    debug!("Admin listing experiments");

    let mut query = ExperimentQuery::new();

    if let Some(ref status) = params.status {
        query = query.with_status(parse_status(status)?);
    }

    if let Some(ref item_id) = params.item_id {
        let item_id = ItemId::new(item_id)
            .map_err(|e| ApiError::bad_request(e.to_string()).with_param("item_id"))?;
        query = query.with_item(item_id);
    }

    if let Some(limit) = params.limit {
        query = query.with_limit(limit);
    }

    if let Some(offset) = params.offset {
        query = query.with_offset(offset);
    }

    let experiments = state.experiment_service.list(&query).await?;

    let responses: Vec<ExperimentResponse> =
        experiments.iter().map(ExperimentResponse::from).collect();
    let total = responses.len();

    Ok(Json(ListExperimentsResponse {
        experiments: responses,
        total,
    }))
}

/// POST /admin/experiments
pub async fn create_experiment(
    State(state): State<AppState>,
    Json(request): Json<CreateExperimentRequest>,
) -> Result<Json<ExperimentResponse>, ApiError> {
    debug!(experiment_id = %request.id, "Admin creating experiment");

    let experiment = state.experiment_service.create(request).await?;

    Ok(Json(ExperimentResponse::from(&experiment)))
}

/// GET /admin/experiments/{id}
pub async fn get_experiment(
    State(state): State<AppState>,
    Path(experiment_id): Path<String>,
) -> Result<Json<ExperimentResponse>, ApiError> {
    debug!(experiment_id = %experiment_id, "Admin getting experiment");

    let experiment = state
        .experiment_service
        .get(&experiment_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Experiment '{}' not found", experiment_id)))?;

    Ok(Json(ExperimentResponse::from(&experiment)))
}

/// POST /admin/experiments/{id}/start
pub async fn start_experiment(
    State(state): State<AppState>,
    Path(experiment_id): Path<String>,
) -> Result<Json<ExperimentResponse>, ApiError> {
    let experiment = state.experiment_service.start(&experiment_id).await?;
    Ok(Json(ExperimentResponse::from(&experiment)))
}

/// POST /admin/experiments/{id}/suspend
pub async fn suspend_experiment(
    State(state): State<AppState>,
    Path(experiment_id): Path<String>,
) -> Result<Json<ExperimentResponse>, ApiError> {
    let experiment = state.experiment_service.suspend(&experiment_id).await?;
    Ok(Json(ExperimentResponse::from(&experiment)))
}

/// POST /admin/experiments/{id}/resume
pub async fn resume_experiment(
    State(state): State<AppState>,
    Path(experiment_id): Path<String>,
) -> Result<Json<ExperimentResponse>, ApiError> {
    let experiment = state.experiment_service.resume(&experiment_id).await?;
    Ok(Json(ExperimentResponse::from(&experiment)))
}

/// POST /admin/experiments/{id}/complete
pub async fn complete_experiment(
    State(state): State<AppState>,
    Path(experiment_id): Path<String>,
) -> Result<Json<ExperimentResponse>, ApiError> {
    let experiment = state.experiment_service.complete(&experiment_id).await?;
    Ok(Json(ExperimentResponse::from(&experiment)))
}
