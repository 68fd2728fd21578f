//! Core domain logic for the petcare tracker.
//! This crate is the single source of truth for pet-health invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, ManualClock, SharedClock, SystemClock};
pub use config::{AppConfig, ConfigError, DEFAULT_CONFIG_FILE};
pub use logging::{default_log_level, flush_logging, init_logging, logging_status, LoggingError};
pub use model::pet::{GroomingEntry, MealEntry, PetState, Targets, Vitals, WeightEntry};
pub use model::routine::{RoutineKind, RoutineScheduler};
pub use model::validation::PetValidationError;
pub use repo::pet_repo::{
    PersistedState, PetRepository, RepoError, RepoResult, RoutineRecord, SqlitePetRepository,
};
pub use service::pet_service::{
    apply_day_rollover, HydrationReport, PersistOp, PetService, ServiceError, ServiceResult,
    SettingsUpdate,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
