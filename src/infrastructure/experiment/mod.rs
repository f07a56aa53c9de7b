//! Infrastructure for experiment storage and allocation

mod consistent_hashing;
mod in_memory_repository;

pub use consistent_hashing::ConsistentHasher;
pub use in_memory_repository::InMemoryExperimentRepository;
