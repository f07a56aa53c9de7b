//! Experiment domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::validation::{
    validate_identifier, ExperimentValidationError, MAX_VALUES_PER_VARIABLE,
};
use crate::domain::content::{DeviceId, ItemId};

// ============================================================================
// ExperimentId
// ============================================================================

/// Unique identifier for an experiment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExperimentId(String);

impl ExperimentId {
    /// Create a new experiment ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, ExperimentValidationError> {
        let id = id.into();
        validate_identifier("Experiment", &id)?;
        Ok(Self(id))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExperimentId {
    type Error = ExperimentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExperimentId> for String {
    fn from(id: ExperimentId) -> Self {
        id.0
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ExperimentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// ExperimentStatus
// ============================================================================

/// Status of an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Experiment is being configured, not yet running
    #[default]
    Draft,
    /// Experiment is live and eligible for exposure
    Running,
    /// Experiment was taken out of rotation, manually or automatically
    Suspended,
    /// Experiment has finished
    Completed,
}

impl ExperimentStatus {
    /// Check if the experiment is currently running
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if a transition to the target status is valid
    pub fn can_transition_to(&self, target: ExperimentStatus) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Running)
                | (Self::Running, Self::Suspended)
                | (Self::Running, Self::Completed)
                | (Self::Suspended, Self::Running)
                | (Self::Suspended, Self::Completed)
        )
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Running => write!(f, "running"),
            Self::Suspended => write!(f, "suspended"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Why an experiment was suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendReason {
    /// A variant value points at content that no longer exists
    BrokenDatasource,
    /// An operator suspended it
    Manual,
}

impl fmt::Display for SuspendReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrokenDatasource => write!(f, "broken datasource"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

// ============================================================================
// VariantValue / Variable
// ============================================================================

/// One selectable value of a variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantValue {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datasource: Option<ItemId>,
}

impl VariantValue {
    /// Create a value without a datasource (e.g. hiding a component)
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            datasource: None,
        }
    }

    /// Point this value at a datasource item
    pub fn with_datasource(mut self, datasource: ItemId) -> Self {
        self.datasource = Some(datasource);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The content item this value renders, if any
    pub fn datasource(&self) -> Option<&ItemId> {
        self.datasource.as_ref()
    }
}

/// One axis of variation, usually a component slot on the page.
///
/// The position of a value in `values` is its identity in combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    id: String,
    name: String,
    values: Vec<VariantValue>,
}

impl Variable {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Append a value
    pub fn with_value(mut self, value: VariantValue) -> Self {
        self.values.push(value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[VariantValue] {
        &self.values
    }

    /// Get the value at an index
    pub fn value(&self, index: u8) -> Option<&VariantValue> {
        self.values.get(usize::from(index))
    }
}

// ============================================================================
// ExperimentDefinition
// ============================================================================

/// A content test configured on an item for one device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentDefinition {
    id: ExperimentId,
    name: String,
    #[serde(default)]
    status: ExperimentStatus,
    item_id: ItemId,
    #[serde(default)]
    device_id: DeviceId,
    #[serde(default = "default_traffic_allocation")]
    traffic_allocation: u8,
    variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    suspend_reason: Option<SuspendReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    suspended_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
}

fn default_traffic_allocation() -> u8 {
    100
}

impl ExperimentDefinition {
    /// Create a new experiment in Draft status with full traffic allocation
    pub fn new(
        id: ExperimentId,
        name: impl Into<String>,
        item_id: ItemId,
        device_id: DeviceId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            status: ExperimentStatus::Draft,
            item_id,
            device_id,
            traffic_allocation: default_traffic_allocation(),
            variables: Vec::new(),
            suspend_reason: None,
            started_at: None,
            suspended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    // Builder methods

    /// Add a variable
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Set the traffic allocation percentage, clamped to 100
    pub fn with_traffic_allocation(mut self, percentage: u8) -> Self {
        self.traffic_allocation = percentage.min(100);
        self
    }

    // Getters

    pub fn id(&self) -> &ExperimentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ExperimentStatus {
        self.status
    }

    /// Check if the experiment is eligible for exposure
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// The item the experiment is configured on
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Percentage (0-100) of eligible clients admitted into the experiment
    pub fn traffic_allocation(&self) -> u8 {
        self.traffic_allocation.min(100)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn suspend_reason(&self) -> Option<SuspendReason> {
        self.suspend_reason
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn suspended_at(&self) -> Option<DateTime<Utc>> {
        self.suspended_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Check if this experiment is configured for the item and device
    pub fn applies_to(&self, item_id: &ItemId, device_id: &DeviceId) -> bool {
        &self.item_id == item_id && &self.device_id == device_id
    }

    /// Check the structural invariants of the variables
    pub fn validate(&self) -> Result<(), ExperimentValidationError> {
        if self.variables.is_empty() {
            return Err(ExperimentValidationError::NoVariables);
        }

        let mut seen = HashSet::new();

        for variable in &self.variables {
            validate_identifier("Variable", variable.id())?;

            if !seen.insert(variable.id()) {
                return Err(ExperimentValidationError::DuplicateVariableId(
                    variable.id().to_string(),
                ));
            }

            let count = variable.values().len();

            if count == 0 {
                return Err(ExperimentValidationError::EmptyVariable(
                    variable.id().to_string(),
                ));
            }

            if count > MAX_VALUES_PER_VARIABLE {
                return Err(ExperimentValidationError::TooManyValues(
                    variable.id().to_string(),
                    count,
                ));
            }
        }

        Ok(())
    }

    // Status transitions

    /// Move to the target status.
    ///
    /// The reason is recorded when suspending and cleared otherwise.
    pub fn transition_to(
        &mut self,
        target: ExperimentStatus,
        reason: Option<SuspendReason>,
    ) -> Result<(), ExperimentValidationError> {
        if !self.status.can_transition_to(target) {
            return Err(ExperimentValidationError::InvalidStatusTransition(
                self.status.to_string(),
                target.to_string(),
            ));
        }

        let now = Utc::now();

        match target {
            ExperimentStatus::Running => {
                if self.started_at.is_none() {
                    self.started_at = Some(now);
                }
                self.suspend_reason = None;
                self.suspended_at = None;
            }
            ExperimentStatus::Suspended => {
                self.suspend_reason = Some(reason.unwrap_or(SuspendReason::Manual));
                self.suspended_at = Some(now);
            }
            ExperimentStatus::Draft | ExperimentStatus::Completed => {}
        }

        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    /// Start the experiment (Draft -> Running)
    pub fn start(&mut self) -> Result<(), ExperimentValidationError> {
        self.transition_to(ExperimentStatus::Running, None)
    }

    /// Suspend the experiment (Running -> Suspended)
    pub fn suspend(&mut self, reason: SuspendReason) -> Result<(), ExperimentValidationError> {
        self.transition_to(ExperimentStatus::Suspended, Some(reason))
    }

    /// Re-activate a suspended experiment (Suspended -> Running)
    pub fn resume(&mut self) -> Result<(), ExperimentValidationError> {
        self.transition_to(ExperimentStatus::Running, None)
    }

    /// Complete the experiment
    pub fn complete(&mut self) -> Result<(), ExperimentValidationError> {
        self.transition_to(ExperimentStatus::Completed, None)
    }
}
