//! Experiment service for content testing
//!
//! Administrative side of experiments: creation and lifecycle changes.
//! Exposure decisions live in the exposure service.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::content::{DeviceId, ItemId};
use crate::domain::experiment::{
    ExperimentDefinition, ExperimentId, ExperimentQuery, ExperimentRepository, ExperimentStatus,
    SuspendReason, Variable, VariantValue,
};
use crate::domain::DomainError;

// ============================================================================
// Request Types
// ============================================================================

/// Request to create a new experiment
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExperimentRequest {
    pub id: String,
    pub name: String,
    pub item_id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub traffic_allocation: Option<u8>,
    pub variables: Vec<CreateVariableRequest>,
}

/// A variable of a new experiment, values in index order
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVariableRequest {
    pub id: String,
    pub name: String,
    pub values: Vec<CreateValueRequest>,
}

/// A selectable value of a new variable
#[derive(Debug, Clone, Deserialize)]
pub struct CreateValueRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub datasource: Option<String>,
}

// ============================================================================
// Experiment Service
// ============================================================================

/// Service for managing content experiments
pub struct ExperimentService {
    repository: Arc<dyn ExperimentRepository>,
}

impl ExperimentService {
    /// Create a new experiment service
    pub fn new(repository: Arc<dyn ExperimentRepository>) -> Self {
        Self { repository }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get an experiment by ID
    pub async fn get(&self, id: &str) -> Result<Option<ExperimentDefinition>, DomainError> {
        let experiment_id = self.parse_id(id)?;
        self.repository.get(&experiment_id).await
    }

    /// List experiments with optional filters
    pub async fn list(
        &self,
        query: &ExperimentQuery,
    ) -> Result<Vec<ExperimentDefinition>, DomainError> {
        self.repository.list(query).await
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a new experiment in Draft status
    pub async fn create(
        &self,
        request: CreateExperimentRequest,
    ) -> Result<ExperimentDefinition, DomainError> {
        debug!(experiment_id = %request.id, "Creating experiment");

        let experiment = self.build_experiment(request)?;
        let created = self.repository.create(experiment).await?;

        info!(
            experiment_id = %created.id(),
            item_id = %created.item_id(),
            variables = created.variables().len(),
            "Experiment created"
        );

        Ok(created)
    }

    /// Register an already built experiment, keeping its status.
    ///
    /// Used when seeding the store at startup.
    pub async fn import(
        &self,
        experiment: ExperimentDefinition,
    ) -> Result<ExperimentDefinition, DomainError> {
        experiment
            .validate()
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let created = self.repository.create(experiment).await?;
        debug!(experiment_id = %created.id(), status = %created.status(), "Experiment imported");

        Ok(created)
    }

    fn build_experiment(
        &self,
        request: CreateExperimentRequest,
    ) -> Result<ExperimentDefinition, DomainError> {
        let id = self.parse_id(&request.id)?;
        let item_id =
            ItemId::new(&request.item_id).map_err(|e| DomainError::invalid_id(e.to_string()))?;
        let device_id = match request.device_id {
            Some(device) => {
                DeviceId::new(device).map_err(|e| DomainError::invalid_id(e.to_string()))?
            }
            None => DeviceId::default(),
        };

        if let Some(percentage) = request.traffic_allocation {
            if percentage > 100 {
                return Err(DomainError::validation(format!(
                    "Traffic allocation must be between 0 and 100, got {}",
                    percentage
                )));
            }
        }

        let mut experiment = ExperimentDefinition::new(id, &request.name, item_id, device_id)
            .with_traffic_allocation(request.traffic_allocation.unwrap_or(100));

        for variable_req in request.variables {
            let mut variable = Variable::new(&variable_req.id, &variable_req.name);

            for value_req in variable_req.values {
                let mut value = VariantValue::new(&value_req.id, &value_req.name);

                if let Some(datasource) = value_req.datasource {
                    let datasource = ItemId::new(datasource)
                        .map_err(|e| DomainError::invalid_id(e.to_string()))?;
                    value = value.with_datasource(datasource);
                }

                variable = variable.with_value(value);
            }

            experiment = experiment.with_variable(variable);
        }

        experiment
            .validate()
            .map_err(|e| DomainError::validation(e.to_string()))?;

        Ok(experiment)
    }

    // ========================================================================
    // Lifecycle Operations
    // ========================================================================

    /// Start an experiment (Draft -> Running)
    pub async fn start(&self, id: &str) -> Result<ExperimentDefinition, DomainError> {
        let experiment = self.require(id).await?;

        if experiment.status() != ExperimentStatus::Draft {
            return Err(DomainError::validation(format!(
                "Only draft experiments can be started, '{}' is {}",
                id,
                experiment.status()
            )));
        }

        experiment
            .validate()
            .map_err(|e| DomainError::validation(e.to_string()))?;

        self.move_to(id, experiment.id(), ExperimentStatus::Running, None)
            .await
    }

    /// Suspend a running experiment by hand
    pub async fn suspend(&self, id: &str) -> Result<ExperimentDefinition, DomainError> {
        let experiment_id = self.parse_id(id)?;

        self.move_to(
            id,
            &experiment_id,
            ExperimentStatus::Suspended,
            Some(SuspendReason::Manual),
        )
        .await
    }

    /// Re-activate a suspended experiment (Suspended -> Running)
    pub async fn resume(&self, id: &str) -> Result<ExperimentDefinition, DomainError> {
        let experiment = self.require(id).await?;

        if experiment.status() != ExperimentStatus::Suspended {
            return Err(DomainError::validation(format!(
                "Only suspended experiments can be resumed, '{}' is {}",
                id,
                experiment.status()
            )));
        }

        self.move_to(id, experiment.id(), ExperimentStatus::Running, None)
            .await
    }

    /// Complete an experiment (Running/Suspended -> Completed)
    pub async fn complete(&self, id: &str) -> Result<ExperimentDefinition, DomainError> {
        let experiment_id = self.parse_id(id)?;

        self.move_to(id, &experiment_id, ExperimentStatus::Completed, None)
            .await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn move_to(
        &self,
        id: &str,
        experiment_id: &ExperimentId,
        target: ExperimentStatus,
        reason: Option<SuspendReason>,
    ) -> Result<ExperimentDefinition, DomainError> {
        debug!(experiment_id = %id, target = %target, "Changing experiment status");

        let changed = self
            .repository
            .transition(experiment_id, target, reason)
            .await?;

        if changed {
            info!(experiment_id = %id, status = %target, "Experiment status changed");
        }

        self.require(id).await
    }

    async fn require(&self, id: &str) -> Result<ExperimentDefinition, DomainError> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Experiment '{}' not found", id)))
    }

    fn parse_id(&self, id: &str) -> Result<ExperimentId, DomainError> {
        ExperimentId::new(id).map_err(|e| DomainError::invalid_id(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::experiment::MockExperimentRepository;
    use crate::infrastructure::experiment::InMemoryExperimentRepository;

    fn create_service() -> ExperimentService {
        ExperimentService::new(Arc::new(InMemoryExperimentRepository::new()))
    }

    fn create_valid_request(id: &str) -> CreateExperimentRequest {
        CreateExperimentRequest {
            id: id.to_string(),
            name: format!("Experiment {}", id),
            item_id: "home".to_string(),
            device_id: None,
            traffic_allocation: Some(50),
            variables: vec![CreateVariableRequest {
                id: "hero".to_string(),
                name: "Hero".to_string(),
                values: vec![
                    CreateValueRequest {
                        id: "original".to_string(),
                        name: "Original".to_string(),
                        datasource: None,
                    },
                    CreateValueRequest {
                        id: "bold".to_string(),
                        name: "Bold".to_string(),
                        datasource: Some("hero-bold".to_string()),
                    },
                ],
            }],
        }
    }

    #[tokio::test]
    async fn test_create_experiment() {
        let service = create_service();

        let created = service.create(create_valid_request("hero-test")).await.unwrap();

        assert_eq!(created.id().as_str(), "hero-test");
        assert_eq!(created.status(), ExperimentStatus::Draft);
        assert_eq!(created.traffic_allocation(), 50);
        assert_eq!(created.device_id(), &DeviceId::default());
        assert_eq!(
            created.variables()[0].values()[1].datasource().map(|d| d.as_str()),
            Some("hero-bold")
        );
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let service = create_service();

        service.create(create_valid_request("hero-test")).await.unwrap();
        let result = service.create(create_valid_request("hero-test")).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_create_invalid_id() {
        let service = create_service();

        let result = service.create(create_valid_request("bad id")).await;

        assert!(matches!(result, Err(DomainError::InvalidId { .. })));
    }

    #[tokio::test]
    async fn test_create_without_variables() {
        let service = create_service();
        let mut request = create_valid_request("hero-test");
        request.variables.clear();

        let result = service.create(request).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_with_empty_variable() {
        let service = create_service();
        let mut request = create_valid_request("hero-test");
        request.variables[0].values.clear();

        let result = service.create(request).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_allocation_above_100() {
        let service = create_service();
        let mut request = create_valid_request("hero-test");
        request.traffic_allocation = Some(150);

        let result = service.create(request).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let service = create_service();
        service.create(create_valid_request("hero-test")).await.unwrap();

        let started = service.start("hero-test").await.unwrap();
        assert_eq!(started.status(), ExperimentStatus::Running);
        assert!(started.started_at().is_some());

        let suspended = service.suspend("hero-test").await.unwrap();
        assert_eq!(suspended.status(), ExperimentStatus::Suspended);
        assert_eq!(suspended.suspend_reason(), Some(SuspendReason::Manual));

        let resumed = service.resume("hero-test").await.unwrap();
        assert_eq!(resumed.status(), ExperimentStatus::Running);
        assert!(resumed.suspend_reason().is_none());

        let completed = service.complete("hero-test").await.unwrap();
        assert_eq!(completed.status(), ExperimentStatus::Completed);
    }

    #[tokio::test]
    async fn test_resume_requires_suspended() {
        let service = create_service();
        service.create(create_valid_request("hero-test")).await.unwrap();

        let result = service.resume("hero-test").await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_start_requires_draft() {
        let service = create_service();
        service.create(create_valid_request("hero-test")).await.unwrap();
        service.start("hero-test").await.unwrap();
        service.suspend("hero-test").await.unwrap();

        let result = service.start("hero-test").await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_complete_draft_is_rejected() {
        let service = create_service();
        service.create(create_valid_request("hero-test")).await.unwrap();

        let result = service.complete("hero-test").await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_start_missing_experiment() {
        let service = create_service();

        let result = service.start("missing").await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let service = create_service();
        service.create(create_valid_request("exp-a")).await.unwrap();
        service.create(create_valid_request("exp-b")).await.unwrap();
        service.start("exp-b").await.unwrap();

        let running = service
            .list(&ExperimentQuery::new().with_status(ExperimentStatus::Running))
            .await
            .unwrap();

        assert_eq!(running.len(), 1);
        assert_eq!(running[0].id().as_str(), "exp-b");
    }

    #[tokio::test]
    async fn test_import_keeps_status() {
        let service = create_service();
        let mut experiment = ExperimentDefinition::new(
            ExperimentId::new("seeded").unwrap(),
            "Seeded",
            ItemId::new("home").unwrap(),
            DeviceId::default(),
        )
        .with_variable(Variable::new("hero", "Hero").with_value(VariantValue::new("a", "A")));
        experiment.start().unwrap();

        let imported = service.import(experiment).await.unwrap();

        assert!(imported.is_running());
    }

    #[tokio::test]
    async fn test_storage_error_propagates() {
        let mut repository = MockExperimentRepository::new();
        repository
            .expect_transition()
            .returning(|_, _, _| Err(DomainError::storage("lock poisoned")));
        let service = ExperimentService::new(Arc::new(repository));

        let result = service.complete("hero-test").await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }
}
