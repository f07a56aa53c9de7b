//! Traffic allocation by consistent hashing

use crate::domain::experiment::ExperimentDefinition;
use crate::domain::exposure::{RequestContext, TrafficAllocator};
use crate::infrastructure::experiment::ConsistentHasher;

/// Admits a client when its bucket for the experiment falls inside the
/// configured allocation percentage
#[derive(Debug, Clone, Copy, Default)]
pub struct HashTrafficAllocator;

impl HashTrafficAllocator {
    pub fn new() -> Self {
        Self
    }
}

impl TrafficAllocator for HashTrafficAllocator {
    fn should_include(&self, context: &RequestContext, experiment: &ExperimentDefinition) -> bool {
        match experiment.traffic_allocation() {
            0 => false,
            100 => true,
            percentage => {
                let bucket = ConsistentHasher::hash_assignment(
                    &context.client_id,
                    experiment.id().as_str(),
                );
                ConsistentHasher::is_admitted(bucket, percentage)
            }
        }
    }
}
