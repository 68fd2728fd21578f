//! Raw form input parsing.
//!
//! # Responsibility
//! - Turn user-typed strings into typed values for core calls.
//! - Reject malformed numbers and negative vitals with form-level messages.
//!
//! # Invariants
//! - Range rules owned by the core (meal, weight, target, interval values)
//!   are not duplicated here; only number format and vitals sign are.

use petcare_core::{PetValidationError, RoutineKind};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Form-level input problem with a dialog-style title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError {
    pub title: &'static str,
    pub message: String,
}

impl InputError {
    fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            title: "Invalid Input",
            message: message.into(),
        }
    }

    fn invalid_settings(message: impl Into<String>) -> Self {
        Self {
            title: "Invalid Settings",
            message: message.into(),
        }
    }

    /// Maps a core rejection to the message shown for a form.
    pub fn from_validation(err: &PetValidationError) -> Self {
        match err {
            PetValidationError::MissingName => Self::invalid_input("Meal name required"),
            PetValidationError::MissingTaskName => Self::invalid_input("Task name required"),
            PetValidationError::InvalidAmount(_) => Self::invalid_input("Amount must be positive."),
            PetValidationError::InvalidWeight(_) => Self::invalid_input("Weight must be positive."),
            PetValidationError::InvalidTarget { .. } => {
                Self::invalid_settings("Ensure all values are positive.")
            }
            PetValidationError::InvalidInterval(_) => {
                Self::invalid_settings("Interval must be positive")
            }
        }
    }
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "⚠️ {}: {}", self.title, self.message)
    }
}

impl Error for InputError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VitalsInput {
    pub heart_rate: u32,
    pub respiration_rate: u32,
    pub activity_minutes: u32,
    pub scratch_count: u32,
}

pub fn parse_vitals(
    heart_rate: &str,
    respiration_rate: &str,
    activity_minutes: &str,
    scratch_count: &str,
) -> Result<VitalsInput, InputError> {
    let whole = |raw: &str| {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| InputError::invalid_input("Please enter valid whole numbers."))
    };
    let values = [
        whole(heart_rate)?,
        whole(respiration_rate)?,
        whole(activity_minutes)?,
        whole(scratch_count)?,
    ];
    if values.iter().any(|value| *value < 0) {
        return Err(InputError::invalid_input("Values cannot be negative."));
    }
    let [hr, rr, act, scratch] = values.map(|value| u32::try_from(value));
    match (hr, rr, act, scratch) {
        (Ok(heart_rate), Ok(respiration_rate), Ok(activity_minutes), Ok(scratch_count)) => {
            Ok(VitalsInput {
                heart_rate,
                respiration_rate,
                activity_minutes,
                scratch_count,
            })
        }
        _ => Err(InputError::invalid_input("Please enter valid whole numbers.")),
    }
}

pub fn parse_amount(raw: &str) -> Result<f64, InputError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| InputError::invalid_input("Enter a valid number."))
}

pub fn parse_weight(raw: &str) -> Result<f64, InputError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| InputError::invalid_input("Enter a valid weight."))
}

/// Parsed settings form. `None` fields keep their current value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsInput {
    pub target_activity_minutes: Option<i64>,
    pub optimal_weight_kg: Option<f64>,
    pub target_food_amount: Option<f64>,
    pub intervals: BTreeMap<RoutineKind, i64>,
}

pub fn parse_settings(
    target_activity_minutes: Option<&str>,
    optimal_weight_kg: Option<&str>,
    target_food_amount: Option<&str>,
    intervals: &[String],
) -> Result<SettingsInput, InputError> {
    let not_a_number = || InputError::invalid_settings("Please ensure all fields contain valid numbers.");

    let target_activity_minutes = target_activity_minutes
        .map(|raw| raw.trim().parse::<i64>().map_err(|_| not_a_number()))
        .transpose()?;
    let optimal_weight_kg = optimal_weight_kg
        .map(|raw| raw.trim().parse::<f64>().map_err(|_| not_a_number()))
        .transpose()?;
    let target_food_amount = target_food_amount
        .map(|raw| raw.trim().parse::<f64>().map_err(|_| not_a_number()))
        .transpose()?;

    let mut parsed = BTreeMap::new();
    for entry in intervals {
        let (slug, days) = entry.split_once('=').ok_or_else(|| {
            InputError::invalid_settings(format!("Expected <routine>=<days>, got `{entry}`."))
        })?;
        let kind = RoutineKind::from_slug(slug).ok_or_else(|| {
            InputError::invalid_settings(format!("Unknown routine `{}`.", slug.trim()))
        })?;
        // Blank means "leave unchanged", matching an untouched form field.
        if days.trim().is_empty() {
            continue;
        }
        let days = days.trim().parse::<i64>().map_err(|_| not_a_number())?;
        parsed.insert(kind, days);
    }

    Ok(SettingsInput {
        target_activity_minutes,
        optimal_weight_kg,
        target_food_amount,
        intervals: parsed,
    })
}

pub fn parse_routine(raw: &str) -> Result<RoutineKind, InputError> {
    RoutineKind::from_slug(raw).ok_or_else(|| {
        let known: Vec<&str> = RoutineKind::ALL.iter().map(|kind| kind.slug()).collect();
        InputError::invalid_input(format!(
            "Unknown routine `{}`; expected one of {}.",
            raw.trim(),
            known.join("|")
        ))
    })
}
