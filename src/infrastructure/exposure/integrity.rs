//! Datasource-based content integrity

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::content::ContentRepository;
use crate::domain::experiment::{ExperimentDefinition, VariantValue};
use crate::domain::exposure::ContentIntegrity;
use crate::domain::DomainError;

/// A value is usable when it has no datasource or its datasource item exists
pub struct DatasourceIntegrity {
    content: Arc<dyn ContentRepository>,
}

impl DatasourceIntegrity {
    pub fn new(content: Arc<dyn ContentRepository>) -> Self {
        Self { content }
    }
}

#[async_trait]
impl ContentIntegrity for DatasourceIntegrity {
    async fn is_usable(
        &self,
        experiment: &ExperimentDefinition,
        value: &VariantValue,
    ) -> Result<bool, DomainError> {
        let Some(datasource) = value.datasource() else {
            return Ok(true);
        };

        let exists = self.content.get_item(datasource).await?.is_some();
        if !exists {
            debug!(
                experiment_id = %experiment.id(),
                value_id = %value.id(),
                datasource = %datasource,
                "Variant datasource is missing"
            );
        }

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::{ContentItem, DeviceId, ItemId, MockContentRepository};
    use crate::domain::experiment::ExperimentId;
    use crate::infrastructure::content::InMemoryContentRepository;

    fn experiment() -> ExperimentDefinition {
        ExperimentDefinition::new(
            ExperimentId::new("hero-test").unwrap(),
            "Hero",
            ItemId::new("home").unwrap(),
            DeviceId::default(),
        )
    }

    #[tokio::test]
    async fn test_value_without_datasource_is_usable() {
        let mut content = MockContentRepository::new();
        content.expect_get_item().never();
        let integrity = DatasourceIntegrity::new(Arc::new(content));

        let value = VariantValue::new("default", "Default");
        assert!(integrity.is_usable(&experiment(), &value).await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_datasource_is_usable() {
        let content = InMemoryContentRepository::with_items(vec![ContentItem::new(
            ItemId::new("hero-a").unwrap(),
            "Hero A",
        )]);
        let integrity = DatasourceIntegrity::new(Arc::new(content));

        let value = VariantValue::new("a", "A").with_datasource(ItemId::new("hero-a").unwrap());
        assert!(integrity.is_usable(&experiment(), &value).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_datasource_is_broken() {
        let integrity = DatasourceIntegrity::new(Arc::new(InMemoryContentRepository::new()));

        let value = VariantValue::new("b", "B").with_datasource(ItemId::new("hero-b").unwrap());
        assert!(!integrity.is_usable(&experiment(), &value).await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_error_propagates() {
        let mut content = MockContentRepository::new();
        content
            .expect_get_item()
            .returning(|_| Err(DomainError::storage("unavailable")));
        let integrity = DatasourceIntegrity::new(Arc::new(content));

        let value = VariantValue::new("b", "B").with_datasource(ItemId::new("hero-b").unwrap());
        assert!(integrity.is_usable(&experiment(), &value).await.is_err());
    }
}
