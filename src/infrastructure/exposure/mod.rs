//! Exposure components
//!
//! The building blocks of the per-request exposure decision: resolution,
//! integrity validation, suspension, traffic allocation and the sticky
//! token codec.

mod allocator;
mod codec;
mod integrity;
mod resolver;
mod selector;
mod suspender;
mod tracker;
mod validator;

pub use allocator::HashTrafficAllocator;
pub use codec::StickyAssignmentCodec;
pub use integrity::DatasourceIntegrity;
pub use resolver::CombinationResolver;
pub use selector::RandomVariantSelector;
pub use suspender::AutoSuspender;
pub use tracker::{InMemoryExposureTracker, DEFAULT_CLIENT_CAPACITY, DEFAULT_LOG_CAPACITY};
pub use validator::{BrokenValue, CombinationValidator};
