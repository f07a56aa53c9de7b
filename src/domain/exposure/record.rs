//! Exposure records kept by the tracker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::experiment::{Combination, ExperimentId, TestSetId};

/// One "client was shown this combination" event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRecord {
    pub id: String,
    pub client_id: String,
    pub experiment_id: ExperimentId,
    pub test_set_id: TestSetId,
    pub indices: Vec<u8>,
    /// True only when the combination was freshly allocated
    pub first_exposure: bool,
    pub recorded_at: DateTime<Utc>,
}

impl ExposureRecord {
    pub fn new(
        id: impl Into<String>,
        client_id: impl Into<String>,
        experiment_id: ExperimentId,
        combination: &Combination,
        first_exposure: bool,
    ) -> Self {
        Self {
            id: id.into(),
            client_id: client_id.into(),
            experiment_id,
            test_set_id: combination.test_set_id().clone(),
            indices: combination.indices().to_vec(),
            first_exposure,
            recorded_at: Utc::now(),
        }
    }
}
