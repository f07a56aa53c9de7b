//! Automatic suspension of experiments with broken content

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::domain::experiment::{
    ExperimentDefinition, ExperimentRepository, ExperimentStatus, SuspendReason,
};
use crate::infrastructure::observability::record_suspension;

/// Takes an experiment out of rotation when one of its combinations turned
/// out to reference broken content.
///
/// Fire-and-forget: the outcome is logged, never returned. Suspending an
/// already suspended experiment is a no-op.
pub struct AutoSuspender {
    repository: Arc<dyn ExperimentRepository>,
}

impl AutoSuspender {
    pub fn new(repository: Arc<dyn ExperimentRepository>) -> Self {
        Self { repository }
    }

    pub async fn suspend(&self, experiment: &ExperimentDefinition) {
        let result = self
            .repository
            .transition(
                experiment.id(),
                ExperimentStatus::Suspended,
                Some(SuspendReason::BrokenDatasource),
            )
            .await;

        match result {
            Ok(true) => {
                record_suspension(experiment.id().as_str());
                warn!(
                    experiment_id = %experiment.id(),
                    item_id = %experiment.item_id(),
                    reason = %SuspendReason::BrokenDatasource,
                    "Experiment suspended"
                );
            }
            Ok(false) => {
                debug!(experiment_id = %experiment.id(), "Experiment already suspended");
            }
            Err(e) => {
                error!(
                    experiment_id = %experiment.id(),
                    error = %e,
                    "Failed to suspend experiment"
                );
            }
        }
    }
}
