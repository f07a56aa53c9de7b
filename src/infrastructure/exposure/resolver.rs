//! Resolution of the candidate combination for a request

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::experiment::{ExperimentDefinition, TestSet};
use crate::domain::exposure::{
    ExposureSource, RequestContext, Resolution, TokenJar, TrafficAllocator, VariantSelector,
};
use crate::domain::DomainError;

/// Produces the combination a request should see, in precedence order:
/// forced override, valid sticky token, fresh allocation.
///
/// The result is structurally sound but not yet checked for content integrity.
pub struct CombinationResolver {
    selector: Arc<dyn VariantSelector>,
    allocator: Arc<dyn TrafficAllocator>,
}

impl CombinationResolver {
    pub fn new(selector: Arc<dyn VariantSelector>, allocator: Arc<dyn TrafficAllocator>) -> Self {
        Self {
            selector,
            allocator,
        }
    }

    pub async fn resolve(
        &self,
        context: &RequestContext,
        test_set: &TestSet,
        experiment: &ExperimentDefinition,
        tokens: &TokenJar,
    ) -> Result<Resolution, DomainError> {
        if let Some(ref forced) = context.forced_combination {
            return Ok(self.forced(forced, test_set));
        }

        if let Some(indices) = tokens.read(test_set.id()) {
            match test_set.combination(indices) {
                Some(combination) => {
                    return Ok(Resolution::Combination(combination, ExposureSource::Sticky));
                }
                None => {
                    debug!(
                        test_set_id = %test_set.id(),
                        token_len = indices.len(),
                        variables = test_set.variables().len(),
                        "Stale assignment token, allocating again"
                    );
                }
            }
        }

        if !self.allocator.should_include(context, experiment) {
            debug!(
                experiment_id = %experiment.id(),
                allocation = experiment.traffic_allocation(),
                "Request excluded by traffic allocation"
            );
            return Ok(Resolution::Excluded);
        }

        let Some(selected) = self.selector.select(test_set, context).await? else {
            debug!(test_set_id = %test_set.id(), "Variant selector offered no combination");
            return Ok(Resolution::None);
        };

        match test_set.combination(selected.indices()) {
            Some(combination) => Ok(Resolution::Combination(combination, ExposureSource::Fresh)),
            None => {
                warn!(
                    test_set_id = %test_set.id(),
                    combination = %selected,
                    "Variant selector returned a combination that does not fit the test set"
                );
                Ok(Resolution::None)
            }
        }
    }

    fn forced(&self, indices: &[u8], test_set: &TestSet) -> Resolution {
        match test_set.combination(indices) {
            Some(combination) => Resolution::Combination(combination, ExposureSource::Forced),
            None => {
                warn!(
                    test_set_id = %test_set.id(),
                    forced = ?indices,
                    "Forced combination does not fit the test set, ignoring"
                );
                Resolution::None
            }
        }
    }
}
