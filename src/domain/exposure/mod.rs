//! Exposure domain module
//!
//! Types shared by the per-request exposure decision: the request context,
//! the client-held token, decisions and the collaborator capabilities.

mod collaborators;
mod context;
mod decision;
mod record;
mod token;

pub use collaborators::{ContentIntegrity, ExposureTracker, TrafficAllocator, VariantSelector};
pub use context::{PageMode, RequestContext, SessionState, DEFAULT_SITE};
pub use decision::{ExposureDecision, ExposureSource, Resolution};
pub use record::ExposureRecord;
pub use token::{AssignmentToken, TokenJar};

#[cfg(test)]
pub use collaborators::{
    MockContentIntegrity, MockExposureTracker, MockTrafficAllocator, MockVariantSelector,
};
