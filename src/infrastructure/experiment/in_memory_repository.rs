//! In-memory implementation of the experiment repository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::content::{DeviceId, ItemId};
use crate::domain::experiment::{
    ExperimentDefinition, ExperimentId, ExperimentQuery, ExperimentRepository, ExperimentStatus,
    SuspendReason,
};
use crate::domain::DomainError;

/// In-memory experiment repository implementation
#[derive(Debug)]
pub struct InMemoryExperimentRepository {
    experiments: RwLock<HashMap<String, ExperimentDefinition>>,
}

impl InMemoryExperimentRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            experiments: RwLock::new(HashMap::new()),
        }
    }

    /// Create a repository with initial experiments
    pub fn with_experiments(experiments: Vec<ExperimentDefinition>) -> Self {
        let map = experiments
            .into_iter()
            .map(|e| (e.id().as_str().to_string(), e))
            .collect();

        Self {
            experiments: RwLock::new(map),
        }
    }
}

impl Default for InMemoryExperimentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExperimentRepository for InMemoryExperimentRepository {
    async fn create(
        &self,
        experiment: ExperimentDefinition,
    ) -> Result<ExperimentDefinition, DomainError> {
        let id = experiment.id().as_str().to_string();
        let mut experiments = self
            .experiments
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        if experiments.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "Experiment '{}' already exists",
                id
            )));
        }

        experiments.insert(id, experiment.clone());
        Ok(experiment)
    }

    async fn get(&self, id: &ExperimentId) -> Result<Option<ExperimentDefinition>, DomainError> {
        let experiments = self
            .experiments
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(experiments.get(id.as_str()).cloned())
    }

    async fn list(&self, query: &ExperimentQuery) -> Result<Vec<ExperimentDefinition>, DomainError> {
        let experiments = self
            .experiments
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut results: Vec<_> = experiments
            .values()
            .filter(|e| {
                if let Some(status) = query.status {
                    if e.status() != status {
                        return false;
                    }
                }

                if let Some(ref item_id) = query.item_id {
                    if e.item_id() != item_id {
                        return false;
                    }
                }

                true
            })
            .cloned()
            .collect();

        // Newest first
        results.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);

        Ok(results.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_for_item(
        &self,
        item_id: &ItemId,
        device_id: &DeviceId,
    ) -> Result<Vec<ExperimentDefinition>, DomainError> {
        let experiments = self
            .experiments
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut results: Vec<_> = experiments
            .values()
            .filter(|e| e.applies_to(item_id, device_id))
            .cloned()
            .collect();

        // Oldest first so the pick among several is stable
        results.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });

        Ok(results)
    }

    async fn transition(
        &self,
        id: &ExperimentId,
        target: ExperimentStatus,
        reason: Option<SuspendReason>,
    ) -> Result<bool, DomainError> {
        let mut experiments = self
            .experiments
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        let experiment = experiments
            .get_mut(id.as_str())
            .ok_or_else(|| DomainError::not_found(format!("Experiment '{}' not found", id)))?;

        if experiment.status() == target {
            return Ok(false);
        }

        experiment
            .transition_to(target, reason)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::experiment::{Variable, VariantValue};
    use std::sync::Arc;

    fn create_test_experiment(id: &str, item: &str) -> ExperimentDefinition {
        ExperimentDefinition::new(
            ExperimentId::new(id).unwrap(),
            format!("Experiment {}", id),
            ItemId::new(item).unwrap(),
            DeviceId::default(),
        )
        .with_variable(
            Variable::new("hero", "Hero")
                .with_value(VariantValue::new("a", "A"))
                .with_value(VariantValue::new("b", "B")),
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryExperimentRepository::new();
        let exp = create_test_experiment("test-1", "home");

        let created = repo.create(exp).await.unwrap();
        assert_eq!(created.id().as_str(), "test-1");

        let exp_id = ExperimentId::new("test-1").unwrap();
        let fetched = repo.get(&exp_id).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().name(), "Experiment test-1");
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let repo = InMemoryExperimentRepository::new();
        let exp = create_test_experiment("test-1", "home");

        repo.create(exp.clone()).await.unwrap();
        let result = repo.create(exp).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_list_with_pagination() {
        let repo = InMemoryExperimentRepository::new();

        for i in 1..=10 {
            let exp = create_test_experiment(&format!("exp-{}", i), "home");
            repo.create(exp).await.unwrap();
        }

        let all = repo.list(&ExperimentQuery::new()).await.unwrap();
        assert_eq!(all.len(), 10);

        let page = repo
            .list(&ExperimentQuery::new().with_offset(3).with_limit(3))
            .await
            .unwrap();
        assert_eq!(page.len(), 3);
    }

    #[tokio::test]
    async fn test_list_by_status_and_item() {
        let mut running = create_test_experiment("running-1", "home");
        running.start().unwrap();

        let repo = InMemoryExperimentRepository::with_experiments(vec![
            create_test_experiment("draft-1", "home"),
            running,
            create_test_experiment("draft-2", "about"),
        ]);

        let running = repo
            .list(&ExperimentQuery::new().with_status(ExperimentStatus::Running))
            .await
            .unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].id().as_str(), "running-1");

        let about = repo
            .list(&ExperimentQuery::new().with_item(ItemId::new("about").unwrap()))
            .await
            .unwrap();
        assert_eq!(about.len(), 1);
        assert_eq!(about[0].id().as_str(), "draft-2");
    }

    #[tokio::test]
    async fn test_find_for_item_filters_device() {
        let mobile = ExperimentDefinition::new(
            ExperimentId::new("mobile-test").unwrap(),
            "Mobile",
            ItemId::new("home").unwrap(),
            DeviceId::new("mobile").unwrap(),
        );

        let repo = InMemoryExperimentRepository::with_experiments(vec![
            create_test_experiment("desktop-test", "home"),
            mobile,
            create_test_experiment("about-test", "about"),
        ]);

        let home = ItemId::new("home").unwrap();
        let found = repo
            .find_for_item(&home, &DeviceId::default())
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id().as_str(), "desktop-test");
    }

    #[tokio::test]
    async fn test_transition_is_idempotent() {
        let mut exp = create_test_experiment("test-1", "home");
        exp.start().unwrap();
        let repo = InMemoryExperimentRepository::with_experiments(vec![exp]);
        let id = ExperimentId::new("test-1").unwrap();

        let first = repo
            .transition(
                &id,
                ExperimentStatus::Suspended,
                Some(SuspendReason::BrokenDatasource),
            )
            .await
            .unwrap();
        let second = repo
            .transition(
                &id,
                ExperimentStatus::Suspended,
                Some(SuspendReason::BrokenDatasource),
            )
            .await
            .unwrap();

        assert!(first);
        assert!(!second);

        let stored = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.status(), ExperimentStatus::Suspended);
        assert_eq!(stored.suspend_reason(), Some(SuspendReason::BrokenDatasource));
    }

    #[tokio::test]
    async fn test_transition_invalid() {
        let repo =
            InMemoryExperimentRepository::with_experiments(vec![create_test_experiment("t", "home")]);
        let id = ExperimentId::new("t").unwrap();

        let result = repo
            .transition(&id, ExperimentStatus::Suspended, None)
            .await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_transition_not_found() {
        let repo = InMemoryExperimentRepository::new();
        let id = ExperimentId::new("missing").unwrap();

        let result = repo.transition(&id, ExperimentStatus::Running, None).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_suspension_applies_once() {
        let mut exp = create_test_experiment("test-1", "home");
        exp.start().unwrap();
        let repo = Arc::new(InMemoryExperimentRepository::with_experiments(vec![exp]));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let id = ExperimentId::new("test-1").unwrap();
                repo.transition(
                    &id,
                    ExperimentStatus::Suspended,
                    Some(SuspendReason::BrokenDatasource),
                )
                .await
                .unwrap()
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap() {
                applied += 1;
            }
        }

        assert_eq!(applied, 1);
    }
}
