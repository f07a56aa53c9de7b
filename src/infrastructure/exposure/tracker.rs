//! In-memory exposure tracking

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use uuid::Uuid;

use crate::domain::experiment::{Combination, ExperimentDefinition};
use crate::domain::exposure::{ExposureRecord, ExposureTracker, RequestContext};
use crate::domain::DomainError;

/// Default number of exposure records kept
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Default number of clients whose current combination is remembered
pub const DEFAULT_CLIENT_CAPACITY: usize = 100_000;

#[derive(Debug, Default)]
struct TrackerState {
    /// Client id -> (write sequence, record)
    current: HashMap<String, (u64, ExposureRecord)>,
    log: VecDeque<ExposureRecord>,
    next_seq: u64,
}

/// Keeps each client's current combination plus a bounded log of exposures.
///
/// Both are bounded: the log drops its oldest records, and clients that were
/// written least recently are forgotten once `client_capacity` is exceeded.
#[derive(Debug)]
pub struct InMemoryExposureTracker {
    state: RwLock<TrackerState>,
    log_capacity: usize,
    client_capacity: usize,
}

impl InMemoryExposureTracker {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_LOG_CAPACITY, DEFAULT_CLIENT_CAPACITY)
    }

    /// Same bound for the log and the client map
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_limits(capacity, capacity)
    }

    pub fn with_limits(log_capacity: usize, client_capacity: usize) -> Self {
        Self {
            state: RwLock::new(TrackerState::default()),
            log_capacity: log_capacity.max(1),
            client_capacity: client_capacity.max(1),
        }
    }

    /// The combination currently recorded for a client
    pub fn current(&self, client_id: &str) -> Result<Option<ExposureRecord>, DomainError> {
        let state = self
            .state
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(state.current.get(client_id).map(|(_, record)| record.clone()))
    }

    /// Number of clients with a remembered combination
    pub fn client_count(&self) -> Result<usize, DomainError> {
        let state = self
            .state
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(state.current.len())
    }

    /// Forget the least recently written clients once over capacity.
    ///
    /// Evicts down to 90% of capacity so the sort runs once per batch rather
    /// than on every write.
    fn evict_if_needed(current: &mut HashMap<String, (u64, ExposureRecord)>, capacity: usize) {
        if current.len() <= capacity {
            return;
        }

        let target = capacity - capacity / 10;

        let mut entries: Vec<_> = current
            .iter()
            .map(|(client_id, (seq, _))| (*seq, client_id.clone()))
            .collect();
        entries.sort_unstable_by_key(|(seq, _)| *seq);

        let to_remove = current.len() - target;

        for (_, client_id) in entries.into_iter().take(to_remove) {
            current.remove(&client_id);
        }
    }
}

impl Default for InMemoryExposureTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExposureTracker for InMemoryExposureTracker {
    async fn set_combination(
        &self,
        context: &RequestContext,
        combination: &Combination,
        experiment: &ExperimentDefinition,
        first_exposure: bool,
    ) -> Result<(), DomainError> {
        let record = ExposureRecord::new(
            format!("expo-{}", Uuid::new_v4()),
            context.client_id.clone(),
            experiment.id().clone(),
            combination,
            first_exposure,
        );

        let mut state = self
            .state
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        let seq = state.next_seq;
        state.next_seq += 1;

        state
            .current
            .insert(context.client_id.clone(), (seq, record.clone()));
        Self::evict_if_needed(&mut state.current, self.client_capacity);

        state.log.push_front(record);
        state.log.truncate(self.log_capacity);

        Ok(())
    }

    async fn clear(&self, context: &RequestContext) -> Result<(), DomainError> {
        let mut state = self
            .state
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?;

        state.current.remove(&context.client_id);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ExposureRecord>, DomainError> {
        let state = self
            .state
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(state.log.iter().take(limit).cloned().collect())
    }
}
