//! Pet state aggregate.
//!
//! # Responsibility
//! - Hold the pet's latest vitals, configured targets and append-only logs.
//! - Own the five care routine schedulers.
//! - Derive same-day aggregates (food intake) against the shared clock.
//!
//! # Invariants
//! - `record_vitals` is the only writer of both `vitals.activity_minutes` and
//!   `daily_activity[today]`, so they agree right after every call.
//! - Meal, weight and grooming logs are append-only and keep insertion order.
//! - `set_targets` is all-or-nothing.

use crate::clock::SharedClock;
use crate::model::routine::{RoutineKind, RoutineScheduler};
use crate::model::validation::{is_positive_finite, PetValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest observed vitals. All four fields are written together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub heart_rate: u32,
    pub respiration_rate: u32,
    pub activity_minutes: u32,
    pub scratch_count: u32,
}

/// User-configured daily goals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub activity_minutes: u32,
    pub optimal_weight_kg: f64,
    pub food_amount: f64,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            activity_minutes: 60,
            optimal_weight_kg: 6.5,
            food_amount: 2.0,
        }
    }
}

impl Targets {
    /// Builds targets from caller input.
    ///
    /// # Errors
    /// - `InvalidTarget` naming the first out-of-range field.
    pub fn new(
        activity_minutes: i64,
        optimal_weight_kg: f64,
        food_amount: f64,
    ) -> Result<Self, PetValidationError> {
        let activity_minutes =
            u32::try_from(activity_minutes).map_err(|_| PetValidationError::InvalidTarget {
                field: "activity_minutes",
                value: activity_minutes as f64,
            })?;
        if !is_positive_finite(optimal_weight_kg) {
            return Err(PetValidationError::InvalidTarget {
                field: "optimal_weight_kg",
                value: optimal_weight_kg,
            });
        }
        if !is_positive_finite(food_amount) {
            return Err(PetValidationError::InvalidTarget {
                field: "food_amount",
                value: food_amount,
            });
        }
        Ok(Self {
            activity_minutes,
            optimal_weight_kg,
            food_amount,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub date: NaiveDate,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroomingEntry {
    pub date: NaiveDate,
    pub description: String,
}

/// In-memory aggregate for the single tracked pet.
#[derive(Debug)]
pub struct PetState {
    name: String,
    clock: SharedClock,
    vitals: Vitals,
    targets: Targets,
    meals: Vec<MealEntry>,
    weights: Vec<WeightEntry>,
    grooming_log: Vec<GroomingEntry>,
    daily_activity: BTreeMap<NaiveDate, u32>,
    routines: BTreeMap<RoutineKind, RoutineScheduler>,
}

impl PetState {
    /// Creates a pet with zero vitals, default targets and default routines
    /// all completed today.
    pub fn new(name: impl Into<String>, clock: SharedClock) -> Self {
        let routines = RoutineKind::ALL
            .into_iter()
            .map(|kind| (kind, RoutineScheduler::for_kind(kind, clock.clone())))
            .collect();
        Self {
            name: name.into(),
            clock,
            vitals: Vitals::default(),
            targets: Targets::default(),
            meals: Vec::new(),
            weights: Vec::new(),
            grooming_log: Vec::new(),
            daily_activity: BTreeMap::new(),
            routines,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn vitals(&self) -> Vitals {
        self.vitals
    }

    pub fn targets(&self) -> Targets {
        self.targets
    }

    /// Overwrites all four vitals and snapshots today's activity minutes.
    ///
    /// Returns the date the snapshot was keyed under.
    pub fn record_vitals(
        &mut self,
        heart_rate: u32,
        respiration_rate: u32,
        activity_minutes: u32,
        scratch_count: u32,
    ) -> NaiveDate {
        let today = self.clock.today();
        self.vitals = Vitals {
            heart_rate,
            respiration_rate,
            activity_minutes,
            scratch_count,
        };
        self.daily_activity.insert(today, activity_minutes);
        today
    }

    /// Appends a meal entry.
    ///
    /// The stored name is trimmed.
    ///
    /// # Errors
    /// - `MissingName` when `name` is blank.
    /// - `InvalidAmount` when `amount` is not positive and finite.
    pub fn log_meal(
        &mut self,
        date: NaiveDate,
        name: &str,
        amount: f64,
    ) -> Result<MealEntry, PetValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PetValidationError::MissingName);
        }
        if !is_positive_finite(amount) {
            return Err(PetValidationError::InvalidAmount(amount));
        }
        let entry = MealEntry {
            date,
            name: name.to_string(),
            amount,
        };
        self.meals.push(entry.clone());
        Ok(entry)
    }

    /// Sums meal amounts dated today.
    pub fn today_food_total(&self) -> f64 {
        let today = self.clock.today();
        self.meals
            .iter()
            .filter(|meal| meal.date == today)
            .fold(0.0, |total, meal| total + meal.amount)
    }

    /// # Errors
    /// - `InvalidWeight` when `weight_kg` is not positive and finite.
    pub fn log_weight(
        &mut self,
        date: NaiveDate,
        weight_kg: f64,
    ) -> Result<WeightEntry, PetValidationError> {
        if !is_positive_finite(weight_kg) {
            return Err(PetValidationError::InvalidWeight(weight_kg));
        }
        let entry = WeightEntry { date, weight_kg };
        self.weights.push(entry.clone());
        Ok(entry)
    }

    pub fn log_grooming(&mut self, date: NaiveDate, description: impl Into<String>) -> GroomingEntry {
        let entry = GroomingEntry {
            date,
            description: description.into(),
        };
        self.grooming_log.push(entry.clone());
        entry
    }

    /// Replaces all three targets at once.
    ///
    /// # Errors
    /// - `InvalidTarget` when any value is out of range; no target changes.
    pub fn set_targets(
        &mut self,
        activity_minutes: i64,
        optimal_weight_kg: f64,
        food_amount: f64,
    ) -> Result<(), PetValidationError> {
        self.targets = Targets::new(activity_minutes, optimal_weight_kg, food_amount)?;
        Ok(())
    }

    pub fn meals(&self) -> &[MealEntry] {
        &self.meals
    }

    pub fn weights(&self) -> &[WeightEntry] {
        &self.weights
    }

    pub fn grooming_log(&self) -> &[GroomingEntry] {
        &self.grooming_log
    }

    /// Returns an owned copy of the per-day activity snapshots.
    pub fn daily_activity_snapshot(&self) -> BTreeMap<NaiveDate, u32> {
        self.daily_activity.clone()
    }

    pub fn routine(&self, kind: RoutineKind) -> &RoutineScheduler {
        &self.routines[&kind]
    }

    pub fn routine_mut(&mut self, kind: RoutineKind) -> &mut RoutineScheduler {
        let clock = &self.clock;
        self.routines
            .entry(kind)
            .or_insert_with(|| RoutineScheduler::for_kind(kind, clock.clone()))
    }

    /// Iterates routines in `RoutineKind` declaration order.
    pub fn routines(&self) -> impl Iterator<Item = (RoutineKind, &RoutineScheduler)> {
        self.routines.iter().map(|(kind, routine)| (*kind, routine))
    }

    /// Task names of every routine that is due or overdue today.
    pub fn due_routine_names(&self) -> Vec<String> {
        let today = self.clock.today();
        self.routines
            .values()
            .filter(|routine| routine.days_until_due_on(today) <= 0)
            .map(|routine| routine.task_name().to_string())
            .collect()
    }

    pub(crate) fn hydrate_vitals(&mut self, vitals: Vitals) {
        self.vitals = vitals;
    }

    pub(crate) fn hydrate_targets(&mut self, targets: Targets) {
        self.targets = targets;
    }

    pub(crate) fn hydrate_daily_activity(&mut self, date: NaiveDate, minutes: u32) {
        self.daily_activity.insert(date, minutes);
    }

    pub(crate) fn hydrate_meal(&mut self, entry: MealEntry) {
        self.meals.push(entry);
    }

    pub(crate) fn hydrate_weight(&mut self, entry: WeightEntry) {
        self.weights.push(entry);
    }

    pub(crate) fn hydrate_grooming(&mut self, entry: GroomingEntry) {
        self.grooming_log.push(entry);
    }
}
