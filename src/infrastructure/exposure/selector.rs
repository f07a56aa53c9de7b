//! Default variant selection

use async_trait::async_trait;
use rand::Rng;

use crate::domain::experiment::{Combination, TestSet};
use crate::domain::exposure::{RequestContext, VariantSelector};
use crate::domain::DomainError;

/// Picks each variable's value uniformly at random
#[derive(Debug, Default, Clone)]
pub struct RandomVariantSelector;

impl RandomVariantSelector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VariantSelector for RandomVariantSelector {
    async fn select(
        &self,
        test_set: &TestSet,
        _context: &RequestContext,
    ) -> Result<Option<Combination>, DomainError> {
        if test_set.variables().is_empty() {
            return Ok(None);
        }

        let mut rng = rand::thread_rng();
        let mut indices = Vec::with_capacity(test_set.variables().len());

        for variable in test_set.variables() {
            let count = variable.values().len();
            if count == 0 {
                return Ok(None);
            }

            let index = u8::try_from(rng.gen_range(0..count)).map_err(|_| {
                DomainError::internal(format!(
                    "Variable '{}' has more values than a combination can address",
                    variable.id()
                ))
            })?;
            indices.push(index);
        }

        Ok(Some(Combination::new(test_set.id().clone(), indices)))
    }
}
