//! Calendar clock abstraction shared by pet state and routine schedulers.
//!
//! # Responsibility
//! - Provide the single source of "today" for every core computation.
//! - Allow deterministic substitution in tests (fixed or advanceable).
//!
//! # Invariants
//! - Clocks report calendar dates only; time-of-day never reaches the core.
//! - One operation reads `today()` once and reuses the value for all
//!   comparisons it performs.

use chrono::{Days, Local, NaiveDate};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// Shared handle used by `PetState` and every `RoutineScheduler`.
pub type SharedClock = Arc<dyn Clock>;

/// Source of the current calendar date.
pub trait Clock: Debug + Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock using the host's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    date: NaiveDate,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn shared(date: NaiveDate) -> SharedClock {
        Arc::new(Self::new(date))
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }
}

/// Settable clock for day-boundary tests.
///
/// Keep an `Arc<ManualClock>` next to the `SharedClock` handed to the core
/// to move time forward mid-test.
#[derive(Debug)]
pub struct ManualClock {
    date: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(date: NaiveDate) -> Arc<Self> {
        Arc::new(Self {
            date: Mutex::new(date),
        })
    }

    pub fn set_today(&self, date: NaiveDate) {
        *self.lock() = date;
    }

    /// Moves the clock forward by `days` calendar days.
    pub fn advance_days(&self, days: u64) {
        let mut guard = self.lock();
        if let Some(next) = guard.checked_add_days(Days::new(days)) {
            *guard = next;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDate> {
        // A poisoned date is still a valid date.
        self.date
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.lock()
    }
}
