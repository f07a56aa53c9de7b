//! Content domain module
//!
//! The content items that experiments are attached to and that variant
//! values point at as datasources.

mod entity;
mod repository;

pub use entity::{ContentItem, DeviceId, ItemId};
pub use repository::ContentRepository;

#[cfg(test)]
pub use repository::MockContentRepository;
