//! Infrastructure services

mod experiment_service;
mod exposure_service;

pub use experiment_service::{
    CreateExperimentRequest, CreateValueRequest, CreateVariableRequest, ExperimentService,
};
pub use exposure_service::{ExposureDependencies, ExposureEvaluator, ExposureSettings};
