//! Infrastructure layer - Implementations of the domain capabilities

pub mod content;
pub mod experiment;
pub mod exposure;
pub mod logging;
pub mod observability;
pub mod services;
