//! Exposure decisions

use serde::{Deserialize, Serialize};

use crate::domain::experiment::{Combination, ExperimentId, TestSetId};

/// Where an exposed combination came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureSource {
    /// Supplied by internal tooling on the request
    Forced,
    /// Reused from the client-held token
    Sticky,
    /// Chosen by the variant selector for this request
    Fresh,
}

/// Outcome of the combination resolution step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing to expose
    None,
    /// The client fell outside the traffic allocation
    Excluded,
    /// A candidate combination, not yet checked for content integrity
    Combination(Combination, ExposureSource),
}

/// Outcome of evaluating a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ExposureDecision {
    /// No experiment applies, the default content is served
    NoExperiment,
    /// An experiment applies but the client is outside its allocation
    Excluded { test_set_id: TestSetId },
    /// The resolved combination referenced broken content and the experiment
    /// was suspended
    Suppressed { experiment_id: ExperimentId },
    /// The client sees this combination
    Exposed {
        experiment_id: ExperimentId,
        combination: Combination,
        source: ExposureSource,
    },
}

impl ExposureDecision {
    /// Check if the client sees a variant
    pub fn is_exposed(&self) -> bool {
        matches!(self, Self::Exposed { .. })
    }

    /// The exposed combination, if any
    pub fn combination(&self) -> Option<&Combination> {
        match self {
            Self::Exposed { combination, .. } => Some(combination),
            _ => None,
        }
    }

    /// Short label used for metrics and logs
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::NoExperiment => "no_experiment",
            Self::Excluded { .. } => "excluded",
            Self::Suppressed { .. } => "suppressed",
            Self::Exposed { .. } => "exposed",
        }
    }
}
