//! Pet persistence contract and SQLite implementation.
//!
//! # Responsibility
//! - Load the full persisted pet state once at startup.
//! - Write through each core mutation (upserts for snapshots, inserts for
//!   append-only logs).
//!
//! # Invariants
//! - The repository owns no state; every call is a direct read or write.
//! - Read paths reject invalid persisted values instead of masking them.
//! - Dates are stored as ISO `YYYY-MM-DD` text.

use crate::db::DbError;
use crate::model::pet::{GroomingEntry, MealEntry, Targets, Vitals, WeightEntry};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for pet persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted pet data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Stored routine progress keyed by task name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineRecord {
    pub task_name: String,
    pub last_completed: NaiveDate,
    pub interval_days: i64,
}

/// Everything the store knows about the pet, as persisted.
///
/// Vitals are raw: the day-boundary reset is applied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub vitals: Vitals,
    /// `None` when vitals were never written.
    pub last_updated: Option<NaiveDate>,
    pub targets: Targets,
    pub meals: Vec<MealEntry>,
    pub weights: Vec<WeightEntry>,
    pub grooming_log: Vec<GroomingEntry>,
    pub routines: Vec<RoutineRecord>,
    pub daily_activity: Vec<(NaiveDate, u32)>,
}

/// Persistence collaborator for the pet core.
pub trait PetRepository {
    fn load_state(&self) -> RepoResult<PersistedState>;
    fn save_vitals(&self, vitals: &Vitals, date: NaiveDate) -> RepoResult<()>;
    fn save_daily_activity(&self, date: NaiveDate, minutes: u32) -> RepoResult<()>;
    fn append_meal(&self, entry: &MealEntry) -> RepoResult<()>;
    fn append_weight(&self, entry: &WeightEntry) -> RepoResult<()>;
    fn append_grooming_log(&self, entry: &GroomingEntry) -> RepoResult<()>;
    fn save_routine(&self, record: &RoutineRecord) -> RepoResult<()>;
    fn save_targets(&self, targets: &Targets) -> RepoResult<()>;
}

/// SQLite-backed pet repository.
pub struct SqlitePetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePetRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_stats(&self) -> RepoResult<(Vitals, Option<NaiveDate>, Targets)> {
        let row = self
            .conn
            .query_row(
                "SELECT
                    heart_rate,
                    respiration_rate,
                    activity_minutes,
                    scratch_count,
                    target_activity_minutes,
                    optimal_weight_kg,
                    target_food_amount,
                    last_updated
                 FROM pet_stats
                 WHERE id = 1;",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>("heart_rate")?,
                        row.get::<_, i64>("respiration_rate")?,
                        row.get::<_, i64>("activity_minutes")?,
                        row.get::<_, i64>("scratch_count")?,
                        row.get::<_, i64>("target_activity_minutes")?,
                        row.get::<_, f64>("optimal_weight_kg")?,
                        row.get::<_, f64>("target_food_amount")?,
                        row.get::<_, Option<String>>("last_updated")?,
                    ))
                },
            )
            .optional()?;

        let Some((hr, rr, act, scratch, tgt_act, opt_wt, tgt_food, last_updated)) = row else {
            return Ok((Vitals::default(), None, Targets::default()));
        };

        let vitals = Vitals {
            heart_rate: to_u32(hr, "pet_stats.heart_rate")?,
            respiration_rate: to_u32(rr, "pet_stats.respiration_rate")?,
            activity_minutes: to_u32(act, "pet_stats.activity_minutes")?,
            scratch_count: to_u32(scratch, "pet_stats.scratch_count")?,
        };
        let targets = Targets::new(tgt_act, opt_wt, tgt_food).map_err(|err| {
            RepoError::InvalidData(format!("invalid targets in pet_stats: {err}"))
        })?;
        let last_updated = last_updated
            .map(|text| parse_date(&text, "pet_stats.last_updated"))
            .transpose()?;

        Ok((vitals, last_updated, targets))
    }

    fn load_meals(&self) -> RepoResult<Vec<MealEntry>> {
        self.collect(
            "SELECT date, name, amount FROM meals ORDER BY date ASC, id ASC;",
            |row| {
                Ok(MealEntry {
                    date: parse_date(&row.get::<_, String>("date")?, "meals.date")?,
                    name: row.get("name")?,
                    amount: row.get("amount")?,
                })
            },
        )
    }

    fn load_weights(&self) -> RepoResult<Vec<WeightEntry>> {
        self.collect(
            "SELECT date, weight_kg FROM weights ORDER BY date ASC, id ASC;",
            |row| {
                Ok(WeightEntry {
                    date: parse_date(&row.get::<_, String>("date")?, "weights.date")?,
                    weight_kg: row.get("weight_kg")?,
                })
            },
        )
    }

    fn load_grooming_log(&self) -> RepoResult<Vec<GroomingEntry>> {
        self.collect(
            "SELECT date, description FROM grooming_logs ORDER BY date ASC, id ASC;",
            |row| {
                Ok(GroomingEntry {
                    date: parse_date(&row.get::<_, String>("date")?, "grooming_logs.date")?,
                    description: row.get("description")?,
                })
            },
        )
    }

    fn load_routines(&self) -> RepoResult<Vec<RoutineRecord>> {
        self.collect(
            "SELECT name, last_done, interval_days FROM routines ORDER BY name ASC;",
            |row| {
                Ok(RoutineRecord {
                    task_name: row.get("name")?,
                    last_completed: parse_date(
                        &row.get::<_, String>("last_done")?,
                        "routines.last_done",
                    )?,
                    interval_days: row.get("interval_days")?,
                })
            },
        )
    }

    fn load_daily_activity(&self) -> RepoResult<Vec<(NaiveDate, u32)>> {
        self.collect(
            "SELECT date, minutes FROM daily_activity ORDER BY date ASC;",
            |row| {
                let date = parse_date(&row.get::<_, String>("date")?, "daily_activity.date")?;
                let minutes = to_u32(row.get("minutes")?, "daily_activity.minutes")?;
                Ok((date, minutes))
            },
        )
    }

    fn collect<T>(
        &self,
        sql: &str,
        parse: impl Fn(&Row<'_>) -> RepoResult<T>,
    ) -> RepoResult<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse(row)?);
        }
        Ok(items)
    }
}

impl PetRepository for SqlitePetRepository<'_> {
    fn load_state(&self) -> RepoResult<PersistedState> {
        let (vitals, last_updated, targets) = self.load_stats()?;
        Ok(PersistedState {
            vitals,
            last_updated,
            targets,
            meals: self.load_meals()?,
            weights: self.load_weights()?,
            grooming_log: self.load_grooming_log()?,
            routines: self.load_routines()?,
            daily_activity: self.load_daily_activity()?,
        })
    }

    fn save_vitals(&self, vitals: &Vitals, date: NaiveDate) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO pet_stats (
                id,
                heart_rate,
                respiration_rate,
                activity_minutes,
                scratch_count,
                last_updated
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                heart_rate = excluded.heart_rate,
                respiration_rate = excluded.respiration_rate,
                activity_minutes = excluded.activity_minutes,
                scratch_count = excluded.scratch_count,
                last_updated = excluded.last_updated;",
            params![
                vitals.heart_rate,
                vitals.respiration_rate,
                vitals.activity_minutes,
                vitals.scratch_count,
                format_date(date),
            ],
        )?;
        Ok(())
    }

    fn save_daily_activity(&self, date: NaiveDate, minutes: u32) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO daily_activity (date, minutes) VALUES (?1, ?2)
             ON CONFLICT (date) DO UPDATE SET minutes = excluded.minutes;",
            params![format_date(date), minutes],
        )?;
        Ok(())
    }

    fn append_meal(&self, entry: &MealEntry) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO meals (date, name, amount) VALUES (?1, ?2, ?3);",
            params![format_date(entry.date), entry.name.as_str(), entry.amount],
        )?;
        Ok(())
    }

    fn append_weight(&self, entry: &WeightEntry) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO weights (date, weight_kg) VALUES (?1, ?2);",
            params![format_date(entry.date), entry.weight_kg],
        )?;
        Ok(())
    }

    fn append_grooming_log(&self, entry: &GroomingEntry) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO grooming_logs (date, description) VALUES (?1, ?2);",
            params![format_date(entry.date), entry.description.as_str()],
        )?;
        Ok(())
    }

    fn save_routine(&self, record: &RoutineRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO routines (name, last_done, interval_days) VALUES (?1, ?2, ?3)
             ON CONFLICT (name) DO UPDATE SET
                last_done = excluded.last_done,
                interval_days = excluded.interval_days;",
            params![
                record.task_name.as_str(),
                format_date(record.last_completed),
                record.interval_days,
            ],
        )?;
        Ok(())
    }

    fn save_targets(&self, targets: &Targets) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO pet_stats (
                id,
                target_activity_minutes,
                optimal_weight_kg,
                target_food_amount
            ) VALUES (1, ?1, ?2, ?3)
            ON CONFLICT (id) DO UPDATE SET
                target_activity_minutes = excluded.target_activity_minutes,
                optimal_weight_kg = excluded.optimal_weight_kg,
                target_food_amount = excluded.target_food_amount;",
            params![
                targets.activity_minutes,
                targets.optimal_weight_kg,
                targets.food_amount,
            ],
        )?;
        Ok(())
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(text: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{text}` in {column}")))
}

fn to_u32(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid value `{value}` in {column}")))
}

#[cfg(test)]
mod tests {
    use super::{format_date, parse_date, to_u32, RepoError};
    use chrono::NaiveDate;

    #[test]
    fn dates_use_iso_calendar_text() {
        let date = NaiveDate::from_ymd_opt(2023, 10, 1).unwrap();
        assert_eq!(format_date(date), "2023-10-01");
        assert_eq!(parse_date("2023-10-01", "t.c").unwrap(), date);
    }

    #[test]
    fn malformed_values_are_invalid_data() {
        let err = parse_date("10/01/2023", "meals.date").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(ref msg) if msg.contains("meals.date")));
        assert!(matches!(to_u32(-4, "x.y"), Err(RepoError::InvalidData(_))));
    }
}
