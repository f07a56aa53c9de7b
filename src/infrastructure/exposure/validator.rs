//! Content-integrity validation of combinations

use std::sync::Arc;

use tracing::warn;

use crate::domain::experiment::{Combination, ExperimentDefinition, TestSet};
use crate::domain::exposure::ContentIntegrity;

/// The first unusable value found in a combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenValue {
    /// Variable position in the test set
    pub position: usize,
    /// Selected value, `None` when the index did not resolve at all
    pub value_id: Option<String>,
}

/// Checks that every value a combination selects still renders usable content.
///
/// Fail-closed: a value that does not resolve, points at missing content, or
/// whose check errors invalidates the whole combination.
pub struct CombinationValidator {
    integrity: Arc<dyn ContentIntegrity>,
}

impl CombinationValidator {
    pub fn new(integrity: Arc<dyn ContentIntegrity>) -> Self {
        Self { integrity }
    }

    /// Check the combination, `true` when every value is usable
    pub async fn validate(
        &self,
        combination: &Combination,
        test_set: &TestSet,
        experiment: &ExperimentDefinition,
    ) -> bool {
        self.find_broken(combination, test_set, experiment)
            .await
            .is_none()
    }

    /// Find the first unusable value, stopping there
    pub async fn find_broken(
        &self,
        combination: &Combination,
        test_set: &TestSet,
        experiment: &ExperimentDefinition,
    ) -> Option<BrokenValue> {
        for (position, value) in combination.values(test_set).into_iter().enumerate() {
            let Some(value) = value else {
                return Some(BrokenValue {
                    position,
                    value_id: None,
                });
            };

            let usable = match self.integrity.is_usable(experiment, value).await {
                Ok(usable) => usable,
                Err(e) => {
                    warn!(
                        experiment_id = %experiment.id(),
                        value_id = %value.id(),
                        error = %e,
                        "Content integrity check failed, treating value as broken"
                    );
                    false
                }
            };

            if !usable {
                return Some(BrokenValue {
                    position,
                    value_id: Some(value.id().to_string()),
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::{DeviceId, ItemId};
    use crate::domain::experiment::{ExperimentId, Variable, VariantValue};
    use crate::domain::exposure::MockContentIntegrity;
    use crate::domain::DomainError;

    fn experiment() -> ExperimentDefinition {
        ExperimentDefinition::new(
            ExperimentId::new("page-test").unwrap(),
            "Page",
            ItemId::new("home").unwrap(),
            DeviceId::default(),
        )
        .with_variable(
            Variable::new("hero", "Hero")
                .with_value(VariantValue::new("hero-a", "A"))
                .with_value(VariantValue::new("hero-b", "B")),
        )
        .with_variable(
            Variable::new("cta", "CTA")
                .with_value(VariantValue::new("cta-a", "A"))
                .with_value(VariantValue::new("cta-broken", "Broken")),
        )
    }

    fn setup(integrity: MockContentIntegrity) -> (CombinationValidator, ExperimentDefinition, TestSet) {
        let exp = experiment();
        let test_set = TestSet::for_experiment(&exp, exp.item_id(), exp.device_id());
        (CombinationValidator::new(Arc::new(integrity)), exp, test_set)
    }

    #[tokio::test]
    async fn test_all_values_usable() {
        let mut integrity = MockContentIntegrity::new();
        integrity.expect_is_usable().times(2).returning(|_, _| Ok(true));
        let (validator, exp, test_set) = setup(integrity);

        let combination = test_set.combination(&[1, 0]).unwrap();
        assert!(validator.validate(&combination, &test_set, &exp).await);
    }

    #[tokio::test]
    async fn test_stops_at_first_broken_value() {
        let mut integrity = MockContentIntegrity::new();
        integrity
            .expect_is_usable()
            .times(1)
            .returning(|_, value| Ok(value.id() != "hero-b"));
        let (validator, exp, test_set) = setup(integrity);

        let combination = test_set.combination(&[1, 1]).unwrap();
        let broken = validator.find_broken(&combination, &test_set, &exp).await;

        assert_eq!(
            broken,
            Some(BrokenValue {
                position: 0,
                value_id: Some("hero-b".to_string())
            })
        );
    }

    #[tokio::test]
    async fn test_broken_second_axis_invalidates_combination() {
        let mut integrity = MockContentIntegrity::new();
        integrity
            .expect_is_usable()
            .returning(|_, value| Ok(value.id() != "cta-broken"));
        let (validator, exp, test_set) = setup(integrity);

        let combination = test_set.combination(&[0, 1]).unwrap();
        assert!(!validator.validate(&combination, &test_set, &exp).await);
    }

    #[tokio::test]
    async fn test_check_error_is_fail_closed() {
        let mut integrity = MockContentIntegrity::new();
        integrity
            .expect_is_usable()
            .returning(|_, _| Err(DomainError::storage("content store down")));
        let (validator, exp, test_set) = setup(integrity);

        let combination = test_set.combination(&[0, 0]).unwrap();
        assert!(!validator.validate(&combination, &test_set, &exp).await);
    }

    #[tokio::test]
    async fn test_unresolvable_index_is_broken() {
        let integrity = MockContentIntegrity::new();
        let (validator, exp, test_set) = setup(integrity);

        let combination = Combination::new(test_set.id().clone(), vec![9, 0]);
        let broken = validator.find_broken(&combination, &test_set, &exp).await;

        assert_eq!(
            broken,
            Some(BrokenValue {
                position: 0,
                value_id: None
            })
        );
    }
}
