//! Experiment validation utilities

use thiserror::Error;

/// Maximum length for any identifier (experiment, item, device, variable, value)
pub const MAX_ID_LENGTH: usize = 50;

/// Maximum number of values a single variable can hold.
///
/// Combinations carry one byte per variable, so indices must fit in a `u8`.
pub const MAX_VALUES_PER_VARIABLE: usize = 256;

/// Validation errors for experiments and their identifiers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExperimentValidationError {
    #[error("{kind} ID cannot be empty")]
    EmptyId { kind: &'static str },

    #[error("{kind} ID exceeds maximum length of {max} characters")]
    IdTooLong { kind: &'static str, max: usize },

    #[error("{kind} ID must start with a letter or number")]
    InvalidIdStart { kind: &'static str },

    #[error("{kind} ID must end with a letter or number")]
    InvalidIdEnd { kind: &'static str },

    #[error("{kind} ID contains invalid character: '{ch}'")]
    InvalidIdCharacter { kind: &'static str, ch: char },

    #[error("{kind} ID cannot contain consecutive hyphens")]
    ConsecutiveHyphens { kind: &'static str },

    #[error("Experiment must have at least 1 variable")]
    NoVariables,

    #[error("Variable '{0}' must have at least 1 value")]
    EmptyVariable(String),

    #[error("Variable '{0}' has {1} values, maximum is 256")]
    TooManyValues(String, usize),

    #[error("Duplicate variable ID: '{0}'")]
    DuplicateVariableId(String),

    #[error("Invalid experiment status transition from {0} to {1}")]
    InvalidStatusTransition(String, String),
}

/// Validate an identifier of the given kind.
///
/// Identifiers are ASCII alphanumerics separated by single hyphens, with
/// no leading or trailing hyphen.
pub fn validate_identifier(kind: &'static str, id: &str) -> Result<(), ExperimentValidationError> {
    let (Some(first_char), Some(last_char)) = (id.chars().next(), id.chars().last()) else {
        return Err(ExperimentValidationError::EmptyId { kind });
    };

    if id.len() > MAX_ID_LENGTH {
        return Err(ExperimentValidationError::IdTooLong {
            kind,
            max: MAX_ID_LENGTH,
        });
    }

    if !first_char.is_ascii_alphanumeric() {
        return Err(ExperimentValidationError::InvalidIdStart { kind });
    }

    if !last_char.is_ascii_alphanumeric() {
        return Err(ExperimentValidationError::InvalidIdEnd { kind });
    }

    let mut prev_was_hyphen = false;

    for ch in id.chars() {
        if ch == '-' {
            if prev_was_hyphen {
                return Err(ExperimentValidationError::ConsecutiveHyphens { kind });
            }
            prev_was_hyphen = true;
        } else if ch.is_ascii_alphanumeric() {
            prev_was_hyphen = false;
        } else {
            return Err(ExperimentValidationError::InvalidIdCharacter { kind, ch });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("Experiment", "exp-1").is_ok());
        assert!(validate_identifier("Experiment", "hero-banner-test").is_ok());
        assert!(validate_identifier("Item", "home").is_ok());
        assert!(validate_identifier("Device", "default").is_ok());
        assert!(validate_identifier("Experiment", "a").is_ok());
    }

    #[test]
    fn test_empty_id() {
        assert_eq!(
            validate_identifier("Item", ""),
            Err(ExperimentValidationError::EmptyId { kind: "Item" })
        );
    }

    #[test]
    fn test_id_too_long() {
        let long_id = "a".repeat(51);
        assert_eq!(
            validate_identifier("Experiment", &long_id),
            Err(ExperimentValidationError::IdTooLong {
                kind: "Experiment",
                max: 50
            })
        );
    }

    #[test]
    fn test_invalid_start_and_end() {
        assert_eq!(
            validate_identifier("Experiment", "-abc"),
            Err(ExperimentValidationError::InvalidIdStart { kind: "Experiment" })
        );
        assert_eq!(
            validate_identifier("Experiment", "abc-"),
            Err(ExperimentValidationError::InvalidIdEnd { kind: "Experiment" })
        );
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            validate_identifier("Item", "abc:def"),
            Err(ExperimentValidationError::InvalidIdCharacter {
                kind: "Item",
                ch: ':'
            })
        );
        assert_eq!(
            validate_identifier("Item", "abc|def"),
            Err(ExperimentValidationError::InvalidIdCharacter {
                kind: "Item",
                ch: '|'
            })
        );
    }

    #[test]
    fn test_consecutive_hyphens() {
        assert_eq!(
            validate_identifier("Device", "abc--def"),
            Err(ExperimentValidationError::ConsecutiveHyphens { kind: "Device" })
        );
    }

    #[test]
    fn test_error_message_names_kind() {
        let err = validate_identifier("Variable", "").unwrap_err();
        assert_eq!(err.to_string(), "Variable ID cannot be empty");
    }
}
