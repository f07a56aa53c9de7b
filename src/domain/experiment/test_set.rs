//! Test sets and combinations

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::{ExperimentDefinition, ExperimentId, Variable, VariantValue};
use super::validation::{validate_identifier, ExperimentValidationError};
use crate::domain::content::{DeviceId, ItemId};

// ============================================================================
// TestSetId
// ============================================================================

/// Identity under which a client's assignment is stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TestSetId(String);

impl TestSetId {
    /// Create a new test set ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, ExperimentValidationError> {
        let id = id.into();
        validate_identifier("Test set", &id)?;
        Ok(Self(id))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ExperimentId> for TestSetId {
    fn from(id: &ExperimentId) -> Self {
        // Experiment IDs follow the same rules
        Self(id.as_str().to_string())
    }
}

impl TryFrom<String> for TestSetId {
    type Error = ExperimentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TestSetId> for String {
    fn from(id: TestSetId) -> Self {
        id.0
    }
}

impl fmt::Display for TestSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TestSet
// ============================================================================

/// The ordered variables under test for one (item, device) pair.
///
/// Derived per request from the experiment snapshot, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSet {
    id: TestSetId,
    experiment_id: ExperimentId,
    item_id: ItemId,
    device_id: DeviceId,
    variables: Vec<Variable>,
}

impl TestSet {
    /// Build the test set of an experiment for the requested item and device
    pub fn for_experiment(
        experiment: &ExperimentDefinition,
        item_id: &ItemId,
        device_id: &DeviceId,
    ) -> Self {
        Self {
            id: TestSetId::from(experiment.id()),
            experiment_id: experiment.id().clone(),
            item_id: item_id.clone(),
            device_id: device_id.clone(),
            variables: experiment.variables().to_vec(),
        }
    }

    pub fn id(&self) -> &TestSetId {
        &self.id
    }

    pub fn experiment_id(&self) -> &ExperimentId {
        &self.experiment_id
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Check that `indices` has one entry per variable and that every entry
    /// selects an existing value.
    pub fn is_in_bounds(&self, indices: &[u8]) -> bool {
        indices.len() == self.variables.len()
            && indices
                .iter()
                .zip(&self.variables)
                .all(|(index, variable)| usize::from(*index) < variable.values().len())
    }

    /// Build a combination from raw indices, `None` when out of shape
    pub fn combination(&self, indices: &[u8]) -> Option<Combination> {
        if !self.is_in_bounds(indices) {
            return None;
        }

        Some(Combination {
            test_set_id: self.id.clone(),
            indices: indices.to_vec(),
        })
    }

    /// Get the value selected at `position` by `index`
    pub fn value_at(&self, position: usize, index: u8) -> Option<&VariantValue> {
        self.variables.get(position)?.value(index)
    }
}

// ============================================================================
// Combination
// ============================================================================

/// One value index per variable of a test set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combination {
    test_set_id: TestSetId,
    indices: Vec<u8>,
}

impl Combination {
    /// Create a combination without checking it against a test set.
    ///
    /// Prefer [`TestSet::combination`] for anything coming from a client.
    pub fn new(test_set_id: TestSetId, indices: Vec<u8>) -> Self {
        Self {
            test_set_id,
            indices,
        }
    }

    pub fn test_set_id(&self) -> &TestSetId {
        &self.test_set_id
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Resolve the selected values, position by position.
    ///
    /// Positions the test set cannot resolve yield `None`.
    pub fn values<'a>(&'a self, test_set: &'a TestSet) -> Vec<Option<&'a VariantValue>> {
        self.indices
            .iter()
            .enumerate()
            .map(|(position, index)| test_set.value_at(position, *index))
            .collect()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.indices.iter().map(|i| i.to_string()).collect();
        write!(f, "{}[{}]", self.test_set_id, parts.join(","))
    }
}
