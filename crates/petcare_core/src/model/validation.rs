//! Validation errors raised by pet and routine domain operations.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected input for a core mutation.
///
/// Every variant is returned before any field changes, so a failed call
/// leaves the target object exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub enum PetValidationError {
    /// Routine interval must be at least one day.
    InvalidInterval(i64),
    /// Target value is negative, non-positive or not finite.
    InvalidTarget {
        field: &'static str,
        value: f64,
    },
    /// Meal amount must be positive and finite.
    InvalidAmount(f64),
    /// Meal name is empty after trimming.
    MissingName,
    /// Weight must be positive and finite.
    InvalidWeight(f64),
    /// Routine task name is empty after trimming.
    MissingTaskName,
}

impl Display for PetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInterval(days) => {
                write!(f, "interval must be positive, got {days}")
            }
            Self::InvalidTarget { field, value } => {
                write!(f, "invalid target `{field}`: {value}")
            }
            Self::InvalidAmount(amount) => write!(f, "amount must be positive, got {amount}"),
            Self::MissingName => write!(f, "meal name required"),
            Self::InvalidWeight(weight) => write!(f, "weight must be positive, got {weight}"),
            Self::MissingTaskName => write!(f, "routine task name required"),
        }
    }
}

impl Error for PetValidationError {}

pub(crate) fn ensure_positive_interval(days: i64) -> Result<i64, PetValidationError> {
    if days <= 0 {
        return Err(PetValidationError::InvalidInterval(days));
    }
    Ok(days)
}

pub(crate) fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
