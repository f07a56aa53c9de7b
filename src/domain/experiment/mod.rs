//! Experiment domain module for content testing
//!
//! Experiments vary the content of a page. Each one owns an ordered list of
//! variables; a combination picks one value per variable.

mod entity;
mod repository;
mod test_set;
mod validation;

pub use entity::{
    ExperimentDefinition, ExperimentId, ExperimentStatus, SuspendReason, Variable, VariantValue,
};
pub use repository::{ExperimentQuery, ExperimentRepository};
pub use test_set::{Combination, TestSet, TestSetId};
pub use validation::{
    validate_identifier, ExperimentValidationError, MAX_ID_LENGTH, MAX_VALUES_PER_VARIABLE,
};

#[cfg(test)]
pub use repository::MockExperimentRepository;
