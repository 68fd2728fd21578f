use chrono::NaiveDate;
use petcare_core::db::open_db_in_memory;
use petcare_core::{
    Clock, FixedClock, GroomingEntry, ManualClock, MealEntry, PersistOp, PersistedState,
    PetRepository, PetService, PetValidationError, RepoError, RepoResult, RoutineKind,
    RoutineRecord, ServiceError, SettingsUpdate, SharedClock, SqlitePetRepository, Targets,
    Vitals, WeightEntry,
};
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn hydrate(conn: &Connection, clock: SharedClock) -> PetService<SqlitePetRepository<'_>> {
    let (service, _) = PetService::hydrate(SqlitePetRepository::new(conn), "Jojo", clock).unwrap();
    service
}

#[test]
fn state_survives_restart_on_the_same_day() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::shared(date(2023, 10, 1));

    {
        let mut service = hydrate(&conn, clock.clone());
        service.record_vitals(80, 20, 45, 2).unwrap();
        service.log_meal_today("Kibble", 1.5).unwrap();
        service.log_weight_today(6.8).unwrap();
        service.log_grooming_today("Nail trim").unwrap();
    }

    let (service, report) =
        PetService::hydrate(SqlitePetRepository::new(&conn), "Jojo", clock).unwrap();
    assert!(!report.day_rollover);
    let pet = service.pet();
    assert_eq!(
        pet.vitals(),
        Vitals {
            heart_rate: 80,
            respiration_rate: 20,
            activity_minutes: 45,
            scratch_count: 2,
        }
    );
    assert_eq!(pet.today_food_total(), 1.5);
    assert_eq!(pet.weights()[0].weight_kg, 6.8);
    assert_eq!(pet.grooming_log()[0].description, "Nail trim");
    assert_eq!(pet.daily_activity_snapshot()[&date(2023, 10, 1)], 45);
}

#[test]
fn next_day_hydration_resets_vitals_but_keeps_scratch_and_history() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(date(2023, 10, 1));

    {
        let mut service = hydrate(&conn, clock.clone());
        service.record_vitals(80, 20, 45, 6).unwrap();
        service.log_meal_today("Kibble", 1.5).unwrap();
    }

    clock.advance_days(1);
    let (service, report) =
        PetService::hydrate(SqlitePetRepository::new(&conn), "Jojo", clock.clone()).unwrap();
    assert!(report.day_rollover);
    assert!(report.write_back_error.is_none());

    let pet = service.pet();
    assert_eq!(
        pet.vitals(),
        Vitals {
            heart_rate: 0,
            respiration_rate: 0,
            activity_minutes: 0,
            scratch_count: 6,
        }
    );
    assert_eq!(pet.today_food_total(), 0.0);
    assert_eq!(pet.meals().len(), 1);
    assert_eq!(pet.daily_activity_snapshot()[&date(2023, 10, 1)], 45);

    let (stored_date, stored_hr): (String, i64) = conn
        .query_row(
            "SELECT last_updated, heart_rate FROM pet_stats WHERE id = 1;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(stored_date, "2023-10-02");
    assert_eq!(stored_hr, 0);

    drop(service);
    let (_, report) =
        PetService::hydrate(SqlitePetRepository::new(&conn), "Jojo", clock).unwrap();
    assert!(!report.day_rollover);
}

/// Once armed, answers the first read with the start date and every later
/// read with the following day.
#[derive(Debug)]
struct MidnightClock {
    start: NaiveDate,
    armed: AtomicBool,
    reads_since_armed: AtomicUsize,
}

impl MidnightClock {
    fn new(start: NaiveDate) -> Arc<Self> {
        Arc::new(Self {
            start,
            armed: AtomicBool::new(false),
            reads_since_armed: AtomicUsize::new(0),
        })
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn reads_since_armed(&self) -> usize {
        self.reads_since_armed.load(Ordering::SeqCst)
    }
}

impl Clock for MidnightClock {
    fn today(&self) -> NaiveDate {
        if !self.armed.load(Ordering::SeqCst) {
            return self.start;
        }
        if self.reads_since_armed.fetch_add(1, Ordering::SeqCst) == 0 {
            self.start
        } else {
            self.start.succ_opt().unwrap()
        }
    }
}

#[test]
fn record_vitals_keys_memory_and_store_by_the_same_day() {
    let conn = open_db_in_memory().unwrap();
    let clock = MidnightClock::new(date(2023, 10, 1));
    let mut service = hydrate(&conn, clock.clone());

    clock.arm();
    service.record_vitals(80, 20, 45, 0).unwrap();
    assert_eq!(clock.reads_since_armed(), 1);

    let in_memory: Vec<(NaiveDate, u32)> =
        service.pet().daily_activity_snapshot().into_iter().collect();
    let stored = SqlitePetRepository::new(&conn)
        .load_state()
        .unwrap()
        .daily_activity;
    assert_eq!(in_memory, vec![(date(2023, 10, 1), 45)]);
    assert_eq!(stored, in_memory);

    let stored_date: String = conn
        .query_row("SELECT last_updated FROM pet_stats WHERE id = 1;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored_date, "2023-10-01");
}

#[test]
fn complete_routine_persists_progress_and_grooming_note() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::new(date(2023, 10, 1));

    {
        let mut service = hydrate(&conn, clock.clone());
        clock.advance_days(10);
        assert!(service.pet().routine(RoutineKind::Ears).is_due());

        let entry = service.complete_routine(RoutineKind::Ears).unwrap();
        assert_eq!(entry.description, "Ear Cleaning Done");
        assert_eq!(entry.date, date(2023, 10, 11));
        assert_eq!(service.pet().routine(RoutineKind::Ears).days_until_due(), 4);
    }

    clock.advance_days(1);
    let service = hydrate(&conn, clock);
    let ears = service.pet().routine(RoutineKind::Ears);
    assert_eq!(ears.last_completed(), date(2023, 10, 11));
    assert_eq!(ears.days_until_due(), 3);
    assert_eq!(service.pet().grooming_log().len(), 1);
}

#[test]
fn care_due_check_lists_overdue_routines_after_hydration() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePetRepository::new(&conn);
    repo.save_routine(&RoutineRecord {
        task_name: "Parasite Prevention".to_string(),
        last_completed: date(2023, 9, 1),
        interval_days: 30,
    })
    .unwrap();
    repo.save_routine(&RoutineRecord {
        task_name: "Teeth Brushing".to_string(),
        last_completed: date(2023, 10, 1),
        interval_days: 1,
    })
    .unwrap();
    repo.save_routine(&RoutineRecord {
        task_name: "Retired Task".to_string(),
        last_completed: date(2020, 1, 1),
        interval_days: 1,
    })
    .unwrap();

    let service = hydrate(&conn, FixedClock::shared(date(2023, 10, 1)));
    assert_eq!(
        service.care_due_check(),
        vec!["Parasite Prevention".to_string()]
    );
}

#[test]
fn persisted_non_positive_interval_fails_hydration() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO routines (name, last_done, interval_days) VALUES ('Bathing', '2023-10-01', 0);",
        [],
    )
    .unwrap();

    let result = PetService::hydrate(
        SqlitePetRepository::new(&conn),
        "Jojo",
        FixedClock::shared(date(2023, 10, 1)),
    );
    match result {
        Err(ServiceError::Persistence {
            operation: PersistOp::LoadState,
            source: RepoError::InvalidData(message),
        }) => assert!(message.contains("Bathing")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("hydration should fail"),
    }
}

#[test]
fn update_settings_is_all_or_nothing() {
    let conn = open_db_in_memory().unwrap();
    let mut service = hydrate(&conn, FixedClock::shared(date(2023, 10, 1)));

    let bad = SettingsUpdate {
        target_activity_minutes: 90,
        optimal_weight_kg: 7.0,
        target_food_amount: 2.5,
        intervals: BTreeMap::from([(RoutineKind::Teeth, 2), (RoutineKind::Bathing, 0)]),
    };
    let err = service.update_settings(&bad).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(PetValidationError::InvalidInterval(0))
    ));
    assert_eq!(service.pet().targets(), Targets::default());
    assert_eq!(service.pet().routine(RoutineKind::Teeth).interval_days(), 1);

    let good = SettingsUpdate {
        intervals: BTreeMap::from([(RoutineKind::Bathing, 10)]),
        ..bad
    };
    service.update_settings(&good).unwrap();
    drop(service);

    let service = hydrate(&conn, FixedClock::shared(date(2023, 10, 1)));
    assert_eq!(service.pet().targets(), Targets::new(90, 7.0, 2.5).unwrap());
    assert_eq!(service.pet().routine(RoutineKind::Bathing).interval_days(), 10);
    assert_eq!(service.pet().routine(RoutineKind::Teeth).interval_days(), 1);
    let routines: i64 = conn
        .query_row("SELECT COUNT(*) FROM routines;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(routines, 5);
}

#[test]
fn invalid_meal_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let mut service = hydrate(&conn, FixedClock::shared(date(2023, 10, 1)));

    let err = service.log_meal_today("  ", 1.0).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(PetValidationError::MissingName)
    ));
    let err = service.log_meal_today("Kibble", -2.0).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(PetValidationError::InvalidAmount(_))
    ));

    let meals: i64 = conn
        .query_row("SELECT COUNT(*) FROM meals;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(meals, 0);
}

/// Repository that fails the configured operations and records the rest.
#[derive(Default)]
struct FlakyRepo {
    failing: HashSet<&'static str>,
    calls: RefCell<Vec<&'static str>>,
}

impl FlakyRepo {
    fn failing(ops: &[&'static str]) -> Self {
        Self {
            failing: ops.iter().copied().collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn call(&self, op: &'static str) -> RepoResult<()> {
        self.calls.borrow_mut().push(op);
        if self.failing.contains(op) {
            return Err(RepoError::InvalidData(format!("{op} unavailable")));
        }
        Ok(())
    }
}

impl PetRepository for FlakyRepo {
    fn load_state(&self) -> RepoResult<PersistedState> {
        self.call("load_state")?;
        Ok(PersistedState {
            vitals: Vitals::default(),
            last_updated: None,
            targets: Targets::default(),
            meals: Vec::new(),
            weights: Vec::new(),
            grooming_log: Vec::new(),
            routines: Vec::new(),
            daily_activity: Vec::new(),
        })
    }

    fn save_vitals(&self, _vitals: &Vitals, _date: NaiveDate) -> RepoResult<()> {
        self.call("save_vitals")
    }

    fn save_daily_activity(&self, _date: NaiveDate, _minutes: u32) -> RepoResult<()> {
        self.call("save_daily_activity")
    }

    fn append_meal(&self, _entry: &MealEntry) -> RepoResult<()> {
        self.call("append_meal")
    }

    fn append_weight(&self, _entry: &WeightEntry) -> RepoResult<()> {
        self.call("append_weight")
    }

    fn append_grooming_log(&self, _entry: &GroomingEntry) -> RepoResult<()> {
        self.call("append_grooming_log")
    }

    fn save_routine(&self, _record: &RoutineRecord) -> RepoResult<()> {
        self.call("save_routine")
    }

    fn save_targets(&self, _targets: &Targets) -> RepoResult<()> {
        self.call("save_targets")
    }
}

#[test]
fn write_failure_is_reported_without_rolling_back_memory() {
    let repo = FlakyRepo::failing(&["append_meal", "save_daily_activity"]);
    let (mut service, _) =
        PetService::hydrate(repo, "Jojo", FixedClock::shared(date(2023, 10, 1))).unwrap();

    let err = service.log_meal_today("Kibble", 1.5).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Persistence {
            operation: PersistOp::AppendMeal,
            ..
        }
    ));
    assert_eq!(service.pet().today_food_total(), 1.5);

    let err = service.record_vitals(70, 18, 30, 1).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Persistence {
            operation: PersistOp::SaveDailyActivity,
            ..
        }
    ));
    assert_eq!(service.pet().vitals().activity_minutes, 30);
    assert_eq!(service.pet().daily_activity_snapshot()[&date(2023, 10, 1)], 30);
}

#[test]
fn load_failure_is_reported_as_load_state() {
    let result = PetService::hydrate(
        FlakyRepo::failing(&["load_state"]),
        "Jojo",
        FixedClock::shared(date(2023, 10, 1)),
    );
    assert!(matches!(
        result,
        Err(ServiceError::Persistence {
            operation: PersistOp::LoadState,
            ..
        })
    ));
}

#[test]
fn rollover_write_back_failure_is_surfaced_in_report() {
    let (service, report) = PetService::hydrate(
        FlakyRepo::failing(&["save_vitals"]),
        "Jojo",
        FixedClock::shared(date(2023, 10, 1)),
    )
    .unwrap();

    assert!(report.day_rollover);
    assert!(matches!(
        report.write_back_error,
        Some(ServiceError::Persistence {
            operation: PersistOp::SaveVitals,
            ..
        })
    ));
    assert_eq!(service.pet().vitals(), Vitals::default());
}

#[test]
fn writes_happen_in_use_case_order() {
    let (mut service, _) = PetService::hydrate(
        FlakyRepo::default(),
        "Jojo",
        FixedClock::shared(date(2023, 10, 1)),
    )
    .unwrap();
    service.complete_routine(RoutineKind::Teeth).unwrap();
    service.record_vitals(1, 2, 3, 4).unwrap();

    let (repo, _) = service.into_parts();
    assert_eq!(
        repo.calls.into_inner(),
        vec![
            "load_state",
            "save_vitals",
            "save_routine",
            "append_grooming_log",
            "save_vitals",
            "save_daily_activity",
        ]
    );
}
