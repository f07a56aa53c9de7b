//! Capabilities the exposure evaluator is built from
//!
//! Each trait stands for a subsystem outside the decision logic. They are
//! injected into the evaluator so tests can substitute fakes.

use async_trait::async_trait;

use super::context::RequestContext;
use super::record::ExposureRecord;
use crate::domain::experiment::{Combination, ExperimentDefinition, TestSet, VariantValue};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Chooses a fresh combination for a client that has none
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VariantSelector: Send + Sync {
    /// Pick one value per variable, `None` when no combination can be offered
    async fn select(
        &self,
        test_set: &TestSet,
        context: &RequestContext,
    ) -> Result<Option<Combination>, DomainError>;
}

/// Tells whether a variant value still renders usable content
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentIntegrity: Send + Sync {
    async fn is_usable(
        &self,
        experiment: &ExperimentDefinition,
        value: &VariantValue,
    ) -> Result<bool, DomainError>;
}

/// Decides whether a request is admitted into an experiment's traffic
#[cfg_attr(test, automock)]
pub trait TrafficAllocator: Send + Sync {
    fn should_include(&self, context: &RequestContext, experiment: &ExperimentDefinition) -> bool;
}

/// Visitor tracking side: remembers which combination a session was shown
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExposureTracker: Send + Sync {
    /// Record that the client sees `combination`
    async fn set_combination(
        &self,
        context: &RequestContext,
        combination: &Combination,
        experiment: &ExperimentDefinition,
        first_exposure: bool,
    ) -> Result<(), DomainError>;

    /// Forget the client's current combination
    async fn clear(&self, context: &RequestContext) -> Result<(), DomainError>;

    /// Most recent exposures first
    async fn recent(&self, limit: usize) -> Result<Vec<ExposureRecord>, DomainError>;
}
