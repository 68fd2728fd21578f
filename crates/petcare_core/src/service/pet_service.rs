//! Pet use-case service.
//!
//! # Responsibility
//! - Hydrate `PetState` from the repository at startup, applying the
//!   day-boundary vitals policy.
//! - Run each core mutation, then write it through to the repository.
//! - Report routines that need care after hydration.
//!
//! # Invariants
//! - In-memory state is updated before the write-through and is never
//!   rolled back when the write fails.
//! - Each use case reads the clock once and uses that date for every write.
//! - The service never retries a failed write.

use crate::clock::SharedClock;
use crate::model::pet::{GroomingEntry, MealEntry, PetState, Targets, Vitals, WeightEntry};
use crate::model::routine::RoutineKind;
use crate::model::validation::{ensure_positive_interval, PetValidationError};
use crate::repo::pet_repo::{PersistedState, PetRepository, RepoError, RoutineRecord};
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Repository call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOp {
    LoadState,
    SaveVitals,
    SaveDailyActivity,
    AppendMeal,
    AppendWeight,
    AppendGroomingLog,
    SaveRoutine,
    SaveTargets,
}

impl PersistOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadState => "load_state",
            Self::SaveVitals => "save_vitals",
            Self::SaveDailyActivity => "save_daily_activity",
            Self::AppendMeal => "append_meal",
            Self::AppendWeight => "append_weight",
            Self::AppendGroomingLog => "append_grooming_log",
            Self::SaveRoutine => "save_routine",
            Self::SaveTargets => "save_targets",
        }
    }
}

impl Display for PersistOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service error for pet use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected by the core; nothing changed.
    Validation(PetValidationError),
    /// Repository call failed; in-memory state already reflects the change.
    Persistence {
        operation: PersistOp,
        source: RepoError,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence { operation, source } => {
                write!(f, "persistence failed during {operation}: {source}")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence { source, .. } => Some(source),
        }
    }
}

impl From<PetValidationError> for ServiceError {
    fn from(value: PetValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Settings form submission: targets plus optional interval changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsUpdate {
    pub target_activity_minutes: i64,
    pub optimal_weight_kg: f64,
    pub target_food_amount: f64,
    /// Routines absent from the map keep their interval.
    pub intervals: BTreeMap<RoutineKind, i64>,
}

/// What happened while hydrating.
#[derive(Debug, Default)]
pub struct HydrationReport {
    /// Same-day vitals were reset because the store was last written on an
    /// earlier day.
    pub day_rollover: bool,
    /// Write-back of reset vitals failed; in-memory vitals are still reset.
    pub write_back_error: Option<ServiceError>,
}

/// Applies the day-boundary policy to persisted vitals.
///
/// When `last_updated` is missing or precedes `today`, heart rate,
/// respiration rate and activity minutes restart at zero while scratch count
/// carries over. Returns the vitals to use and whether a reset happened.
pub fn apply_day_rollover(
    stored: Vitals,
    last_updated: Option<NaiveDate>,
    today: NaiveDate,
) -> (Vitals, bool) {
    let stale = last_updated.map_or(true, |date| date < today);
    if !stale {
        return (stored, false);
    }
    let reset = Vitals {
        heart_rate: 0,
        respiration_rate: 0,
        activity_minutes: 0,
        scratch_count: stored.scratch_count,
    };
    (reset, true)
}

/// Pet service facade over a repository implementation.
pub struct PetService<R: PetRepository> {
    repo: R,
    pet: PetState,
}

impl<R: PetRepository> PetService<R> {
    /// Wraps an already-built pet without loading anything.
    pub fn new(repo: R, pet: PetState) -> Self {
        Self { repo, pet }
    }

    /// Builds a default pet and overwrites it with persisted state.
    ///
    /// # Errors
    /// - `Persistence { operation: LoadState, .. }` when the store cannot be
    ///   read or holds invalid values.
    pub fn hydrate(
        repo: R,
        name: impl Into<String>,
        clock: SharedClock,
    ) -> ServiceResult<(Self, HydrationReport)> {
        let mut pet = PetState::new(name, clock);
        let today = pet.today();

        let persisted = repo.load_state().map_err(|source| {
            error!(
                "event=state_hydrate module=service status=error op={} error={}",
                PersistOp::LoadState,
                source
            );
            ServiceError::Persistence {
                operation: PersistOp::LoadState,
                source,
            }
        })?;

        let (vitals, day_rollover) =
            apply_day_rollover(persisted.vitals, persisted.last_updated, today);
        apply_persisted(&mut pet, persisted, vitals)?;

        let mut service = Self { repo, pet };
        let mut report = HydrationReport {
            day_rollover,
            write_back_error: None,
        };

        if day_rollover {
            info!("event=day_rollover module=service status=ok today={today}");
            if let Err(err) = service.persist(PersistOp::SaveVitals, |repo| {
                repo.save_vitals(&vitals, today)
            }) {
                warn!("event=day_rollover module=service status=warn write_back=failed");
                report.write_back_error = Some(err);
            }
        }

        info!(
            "event=state_hydrate module=service status=ok meals={} weights={} grooming={} activity_days={}",
            service.pet.meals().len(),
            service.pet.weights().len(),
            service.pet.grooming_log().len(),
            service.pet.daily_activity_snapshot().len()
        );
        Ok((service, report))
    }

    pub fn pet(&self) -> &PetState {
        &self.pet
    }

    pub fn into_parts(self) -> (R, PetState) {
        (self.repo, self.pet)
    }

    /// Records vitals and today's activity snapshot, then saves both.
    pub fn record_vitals(
        &mut self,
        heart_rate: u32,
        respiration_rate: u32,
        activity_minutes: u32,
        scratch_count: u32,
    ) -> ServiceResult<()> {
        let today =
            self.pet
                .record_vitals(heart_rate, respiration_rate, activity_minutes, scratch_count);
        let vitals = self.pet.vitals();

        self.persist(PersistOp::SaveVitals, |repo| repo.save_vitals(&vitals, today))?;
        self.persist(PersistOp::SaveDailyActivity, |repo| {
            repo.save_daily_activity(today, vitals.activity_minutes)
        })
    }

    pub fn log_meal(&mut self, date: NaiveDate, name: &str, amount: f64) -> ServiceResult<MealEntry> {
        let entry = self.pet.log_meal(date, name, amount)?;
        self.persist(PersistOp::AppendMeal, |repo| repo.append_meal(&entry))?;
        Ok(entry)
    }

    pub fn log_meal_today(&mut self, name: &str, amount: f64) -> ServiceResult<MealEntry> {
        let today = self.pet.today();
        self.log_meal(today, name, amount)
    }

    pub fn log_weight(&mut self, date: NaiveDate, weight_kg: f64) -> ServiceResult<WeightEntry> {
        let entry = self.pet.log_weight(date, weight_kg)?;
        self.persist(PersistOp::AppendWeight, |repo| repo.append_weight(&entry))?;
        Ok(entry)
    }

    pub fn log_weight_today(&mut self, weight_kg: f64) -> ServiceResult<WeightEntry> {
        let today = self.pet.today();
        self.log_weight(today, weight_kg)
    }

    pub fn log_grooming(
        &mut self,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> ServiceResult<GroomingEntry> {
        let entry = self.pet.log_grooming(date, description);
        self.persist(PersistOp::AppendGroomingLog, |repo| {
            repo.append_grooming_log(&entry)
        })?;
        Ok(entry)
    }

    pub fn log_grooming_today(
        &mut self,
        description: impl Into<String>,
    ) -> ServiceResult<GroomingEntry> {
        let today = self.pet.today();
        self.log_grooming(today, description)
    }

    /// Marks a routine done and records `"<task name> Done"` in the grooming
    /// log.
    pub fn complete_routine(&mut self, kind: RoutineKind) -> ServiceResult<GroomingEntry> {
        let record = {
            let routine = self.pet.routine_mut(kind);
            routine.mark_done();
            routine_record(
                routine.task_name(),
                routine.last_completed(),
                routine.interval_days(),
            )
        };
        let entry = self.pet.log_grooming(
            record.last_completed,
            format!("{} Done", record.task_name),
        );

        self.persist(PersistOp::SaveRoutine, |repo| repo.save_routine(&record))?;
        self.persist(PersistOp::AppendGroomingLog, |repo| {
            repo.append_grooming_log(&entry)
        })?;
        Ok(entry)
    }

    /// Applies targets and interval changes together, then saves targets and
    /// every routine.
    ///
    /// # Errors
    /// - `Validation` when any value is out of range; nothing changes.
    pub fn update_settings(&mut self, update: &SettingsUpdate) -> ServiceResult<()> {
        let targets = Targets::new(
            update.target_activity_minutes,
            update.optimal_weight_kg,
            update.target_food_amount,
        )?;
        for days in update.intervals.values() {
            ensure_positive_interval(*days)?;
        }

        self.pet.set_targets(
            update.target_activity_minutes,
            update.optimal_weight_kg,
            update.target_food_amount,
        )?;
        for (kind, days) in &update.intervals {
            self.pet.routine_mut(*kind).set_interval(*days)?;
        }

        self.persist(PersistOp::SaveTargets, |repo| repo.save_targets(&targets))?;
        let records: Vec<RoutineRecord> = self
            .pet
            .routines()
            .map(|(_, routine)| {
                routine_record(
                    routine.task_name(),
                    routine.last_completed(),
                    routine.interval_days(),
                )
            })
            .collect();
        for record in &records {
            self.persist(PersistOp::SaveRoutine, |repo| repo.save_routine(record))?;
        }
        Ok(())
    }

    /// Task names of every due routine, for the one-time startup alert.
    pub fn care_due_check(&self) -> Vec<String> {
        let due = self.pet.due_routine_names();
        if due.is_empty() {
            debug!("event=care_due module=service status=ok due_count=0");
        } else {
            info!(
                "event=care_due module=service status=due due_count={}",
                due.len()
            );
        }
        due
    }

    fn persist(
        &self,
        operation: PersistOp,
        write: impl FnOnce(&R) -> Result<(), RepoError>,
    ) -> ServiceResult<()> {
        write(&self.repo).map_err(|source| {
            error!(
                "event=persist module=service status=error op={} error={}",
                operation, source
            );
            ServiceError::Persistence { operation, source }
        })
    }
}

fn routine_record(task_name: &str, last_completed: NaiveDate, interval_days: i64) -> RoutineRecord {
    RoutineRecord {
        task_name: task_name.to_string(),
        last_completed,
        interval_days,
    }
}

fn apply_persisted(
    pet: &mut PetState,
    persisted: PersistedState,
    vitals: Vitals,
) -> ServiceResult<()> {
    pet.hydrate_vitals(vitals);
    pet.hydrate_targets(persisted.targets);
    for meal in persisted.meals {
        pet.hydrate_meal(meal);
    }
    for weight in persisted.weights {
        pet.hydrate_weight(weight);
    }
    for entry in persisted.grooming_log {
        pet.hydrate_grooming(entry);
    }
    for record in persisted.routines {
        let Some(kind) = RoutineKind::from_task_name(&record.task_name) else {
            debug!("event=state_hydrate module=service status=skip reason=unknown_routine");
            continue;
        };
        pet.routine_mut(kind)
            .restore(record.last_completed, record.interval_days)
            .map_err(|err| ServiceError::Persistence {
                operation: PersistOp::LoadState,
                source: RepoError::InvalidData(format!(
                    "routine `{}`: {err}",
                    record.task_name
                )),
            })?;
    }
    for (date, minutes) in persisted.daily_activity {
        pet.hydrate_daily_activity(date, minutes);
    }
    Ok(())
}
