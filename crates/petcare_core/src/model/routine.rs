//! Recurring care routine scheduler.
//!
//! # Responsibility
//! - Track when a care task was last completed and how often it recurs.
//! - Derive due status from the shared clock on every query.
//!
//! # Invariants
//! - `interval_days` is always `> 0`; mutations re-validate it.
//! - Due state is never stored; it is recomputed from
//!   `last_completed`, `interval_days` and `clock.today()`.
//! - Only `mark_done` (and hydration via `restore`) moves `last_completed`.

use crate::clock::SharedClock;
use crate::model::validation::{ensure_positive_interval, PetValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The fixed set of care tasks tracked for the pet.
///
/// Declaration order is the display and iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Teeth,
    Ears,
    Grooming,
    ParasitePrevention,
    Bathing,
}

impl RoutineKind {
    pub const ALL: [RoutineKind; 5] = [
        RoutineKind::Teeth,
        RoutineKind::Ears,
        RoutineKind::Grooming,
        RoutineKind::ParasitePrevention,
        RoutineKind::Bathing,
    ];

    /// Human-readable task name, also the persistence key.
    pub fn task_name(self) -> &'static str {
        match self {
            Self::Teeth => "Teeth Brushing",
            Self::Ears => "Ear Cleaning",
            Self::Grooming => "Grooming",
            Self::ParasitePrevention => "Parasite Prevention",
            Self::Bathing => "Bathing",
        }
    }

    pub fn default_interval_days(self) -> i64 {
        match self {
            Self::Teeth => 1,
            Self::Ears => 4,
            Self::Grooming => 14,
            Self::ParasitePrevention => 30,
            Self::Bathing => 7,
        }
    }

    pub fn from_task_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.task_name() == name)
    }

    /// Short identifier used by command-line callers (`teeth`, `ears`, ...).
    pub fn slug(self) -> &'static str {
        match self {
            Self::Teeth => "teeth",
            Self::Ears => "ears",
            Self::Grooming => "grooming",
            Self::ParasitePrevention => "parasite_prevention",
            Self::Bathing => "bathing",
        }
    }

    pub fn from_slug(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|kind| kind.slug() == normalized)
    }
}

/// Scheduler for one recurring care task.
#[derive(Debug, Clone)]
pub struct RoutineScheduler {
    task_name: String,
    interval_days: i64,
    last_completed: NaiveDate,
    clock: SharedClock,
}

impl RoutineScheduler {
    /// Creates a scheduler whose last completion is today.
    ///
    /// A freshly constructed routine is never overdue.
    ///
    /// # Errors
    /// - `MissingTaskName` when `task_name` is blank.
    /// - `InvalidInterval` when `interval_days <= 0`.
    pub fn new(
        task_name: impl Into<String>,
        interval_days: i64,
        clock: SharedClock,
    ) -> Result<Self, PetValidationError> {
        let task_name = task_name.into();
        if task_name.trim().is_empty() {
            return Err(PetValidationError::MissingTaskName);
        }
        let interval_days = ensure_positive_interval(interval_days)?;
        let last_completed = clock.today();
        Ok(Self {
            task_name,
            interval_days,
            last_completed,
            clock,
        })
    }

    pub(crate) fn for_kind(kind: RoutineKind, clock: SharedClock) -> Self {
        Self {
            task_name: kind.task_name().to_string(),
            interval_days: kind.default_interval_days(),
            last_completed: clock.today(),
            clock,
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn interval_days(&self) -> i64 {
        self.interval_days
    }

    pub fn last_completed(&self) -> NaiveDate {
        self.last_completed
    }

    /// Replaces the cadence without resetting progress.
    ///
    /// # Errors
    /// - `InvalidInterval` when `interval_days <= 0`; state is unchanged.
    pub fn set_interval(&mut self, interval_days: i64) -> Result<(), PetValidationError> {
        self.interval_days = ensure_positive_interval(interval_days)?;
        Ok(())
    }

    /// Applies persisted state during hydration.
    ///
    /// # Errors
    /// - `InvalidInterval` when the stored interval is not positive; state is
    ///   unchanged.
    pub fn restore(
        &mut self,
        last_completed: NaiveDate,
        interval_days: i64,
    ) -> Result<(), PetValidationError> {
        self.interval_days = ensure_positive_interval(interval_days)?;
        self.last_completed = last_completed;
        Ok(())
    }

    pub fn mark_done(&mut self) {
        self.last_completed = self.clock.today();
    }

    /// Whole calendar days left before the task is due.
    ///
    /// Zero means due today; negative values count overdue days.
    pub fn days_until_due(&self) -> i64 {
        self.days_until_due_on(self.clock.today())
    }

    pub fn is_due(&self) -> bool {
        self.days_until_due() <= 0
    }

    pub fn status_text(&self) -> String {
        let days = self.days_until_due();
        if days <= 0 {
            format!("🔴 DUE NOW: {}", self.task_name)
        } else {
            format!("✅ {} (Due in {} days)", self.task_name, days)
        }
    }

    pub(crate) fn days_until_due_on(&self, today: NaiveDate) -> i64 {
        let elapsed = today.signed_duration_since(self.last_completed).num_days();
        self.interval_days - elapsed
    }
}
