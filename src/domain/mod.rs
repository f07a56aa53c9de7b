//! Domain layer - Core entities, capabilities and errors

pub mod content;
pub mod error;
pub mod experiment;
pub mod exposure;

pub use content::{ContentItem, ContentRepository, DeviceId, ItemId};
pub use error::DomainError;
pub use experiment::{
    Combination, ExperimentDefinition, ExperimentId, ExperimentRepository, ExperimentStatus,
    SuspendReason, TestSet, TestSetId, Variable, VariantValue,
};
pub use exposure::{AssignmentToken, ExposureDecision, RequestContext, TokenJar};
