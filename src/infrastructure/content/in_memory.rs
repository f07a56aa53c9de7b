//! In-memory content repository

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::domain::content::{ContentItem, ContentRepository, ItemId};
use crate::domain::DomainError;

/// Content items held in memory, ordered by ID
#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    items: RwLock<BTreeMap<ItemId, ContentItem>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial items
    pub fn with_items(items: Vec<ContentItem>) -> Self {
        let map = items.into_iter().map(|i| (i.id().clone(), i)).collect();

        Self {
            items: RwLock::new(map),
        }
    }

    /// Remove an item, returning whether it existed
    pub fn remove_item(&self, id: &ItemId) -> Result<bool, DomainError> {
        let mut items = self
            .items
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(items.remove(id).is_some())
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn get_item(&self, id: &ItemId) -> Result<Option<ContentItem>, DomainError> {
        let items = self
            .items
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(items.get(id).cloned())
    }

    async fn save_item(&self, item: ContentItem) -> Result<ContentItem, DomainError> {
        let mut items = self
            .items
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        items.insert(item.id().clone(), item.clone());
        Ok(item)
    }

    async fn list_items(&self) -> Result<Vec<ContentItem>, DomainError> {
        let items = self
            .items
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(items.values().cloned().collect())
    }
}
