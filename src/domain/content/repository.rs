//! Content repository trait

use async_trait::async_trait;

use super::entity::{ContentItem, ItemId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Lookup of content items by identity
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Get an item by ID, `None` when it does not exist
    async fn get_item(&self, id: &ItemId) -> Result<Option<ContentItem>, DomainError>;

    /// Add or replace an item
    async fn save_item(&self, item: ContentItem) -> Result<ContentItem, DomainError>;

    /// List all items
    async fn list_items(&self) -> Result<Vec<ContentItem>, DomainError>;
}
