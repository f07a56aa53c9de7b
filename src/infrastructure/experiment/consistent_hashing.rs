//! Consistent hashing for traffic allocation
//!
//! Places a client in a stable 0-99 bucket per experiment so that repeated
//! allocation decisions for the same client agree.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Consistent hasher for allocation buckets
#[derive(Debug, Clone, Copy)]
pub struct ConsistentHasher;

impl ConsistentHasher {
    /// Generate a deterministic bucket (0-99) for a client and experiment
    ///
    /// - The same client + experiment always returns the same bucket
    /// - Buckets are uniformly distributed across 0-99
    /// - A client lands in unrelated buckets for different experiments
    pub fn hash_assignment(client_id: &str, experiment_id: &str) -> u8 {
        let mut hasher = DefaultHasher::new();
        client_id.hash(&mut hasher);
        experiment_id.hash(&mut hasher);
        (hasher.finish() % 100) as u8
    }

    /// Check if a bucket falls inside an allocation of `percentage` percent
    pub fn is_admitted(bucket: u8, percentage: u8) -> bool {
        bucket < percentage.min(100)
    }
}
