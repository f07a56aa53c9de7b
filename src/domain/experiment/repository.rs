//! Experiment repository trait and query types

use async_trait::async_trait;

use super::entity::{ExperimentDefinition, ExperimentId, ExperimentStatus, SuspendReason};
use crate::domain::content::{DeviceId, ItemId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

// ============================================================================
// ExperimentQuery
// ============================================================================

/// Query parameters for listing experiments
#[derive(Debug, Clone, Default)]
pub struct ExperimentQuery {
    /// Filter by status
    pub status: Option<ExperimentStatus>,
    /// Filter by owning item
    pub item_id: Option<ItemId>,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Number of results to skip
    pub offset: Option<usize>,
}

impl ExperimentQuery {
    /// Create a new query with no filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by status
    pub fn with_status(mut self, status: ExperimentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by owning item
    pub fn with_item(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    /// Set maximum number of results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set number of results to skip
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

// ============================================================================
// ExperimentRepository
// ============================================================================

/// Configuration store for experiments.
///
/// Reads hand out snapshots; status changes go through [`transition`] so that
/// concurrent callers never overwrite each other's view of the definition.
///
/// [`transition`]: ExperimentRepository::transition
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExperimentRepository: Send + Sync {
    /// Create a new experiment
    async fn create(
        &self,
        experiment: ExperimentDefinition,
    ) -> Result<ExperimentDefinition, DomainError>;

    /// Get an experiment by ID
    async fn get(&self, id: &ExperimentId) -> Result<Option<ExperimentDefinition>, DomainError>;

    /// List experiments with optional filters
    async fn list(&self, query: &ExperimentQuery) -> Result<Vec<ExperimentDefinition>, DomainError>;

    /// Find all experiments configured on an item for a device, in any status
    async fn find_for_item(
        &self,
        item_id: &ItemId,
        device_id: &DeviceId,
    ) -> Result<Vec<ExperimentDefinition>, DomainError>;

    /// Atomically move an experiment to `target`.
    ///
    /// Returns `Ok(false)` when the experiment is already in `target`, and a
    /// validation error when the transition is not allowed.
    async fn transition(
        &self,
        id: &ExperimentId,
        target: ExperimentStatus,
        reason: Option<SuspendReason>,
    ) -> Result<bool, DomainError>;
}
