//! Command-line presentation shell for the petcare core.
//!
//! # Responsibility
//! - Parse raw user input and call one core use case per command.
//! - Render status, logs and the startup care alert as plain text.

mod input;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use petcare_core::db::open_db;
use petcare_core::{
    flush_logging, init_logging, AppConfig, PetService, PetRepository, ServiceError, SettingsUpdate,
    SqlitePetRepository, SystemClock, DEFAULT_CONFIG_FILE,
};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::input::InputError;

#[derive(Parser)]
#[command(name = "petcare")]
#[command(about = "Single-pet health and care routine tracker", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show vitals, food intake and routine status
    Status,
    /// Record today's vitals
    Vitals {
        #[arg(allow_negative_numbers = true)]
        heart_rate: String,
        #[arg(allow_negative_numbers = true)]
        respiration_rate: String,
        #[arg(allow_negative_numbers = true)]
        activity_minutes: String,
        #[arg(allow_negative_numbers = true)]
        scratch_count: String,
    },
    /// Log a meal for today
    Meal {
        name: String,
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },
    /// Log a weigh-in for today
    Weight {
        #[arg(allow_negative_numbers = true)]
        weight_kg: String,
    },
    /// Add a free-form grooming note
    Groom { description: String },
    /// Mark a care routine as done (teeth, ears, grooming, parasite_prevention, bathing)
    Done { routine: String },
    /// Update targets and routine intervals
    Settings {
        #[arg(long, allow_negative_numbers = true)]
        activity_target: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        optimal_weight: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        food_target: Option<String>,
        /// Routine interval as <routine>=<days>; repeatable
        #[arg(long = "interval")]
        intervals: Vec<String>,
    },
    /// Show meal, weight, grooming and activity history
    History,
}

fn main() -> ExitCode {
    let outcome = run_cli(Cli::parse());
    flush_logging();
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load(&cli.config)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open pet store `{}`", config.db_path.display()))?;
    let (mut service, report) = PetService::hydrate(
        SqlitePetRepository::new(&conn),
        config.pet_name.as_str(),
        SystemClock::shared(),
    )
    .context("failed to load pet state")?;

    if let Some(err) = &report.write_back_error {
        eprintln!("warning: {err}");
    }
    if let Some(alert) = render::care_due_alert(&service.care_due_check()) {
        println!("Care Due\n{alert}");
    }

    let command = cli.command.unwrap_or(Commands::Status);
    match run(&mut service, command) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(CommandError::Input(err)) => {
            eprintln!("{err}");
            Ok(ExitCode::from(2))
        }
        Err(CommandError::Service(err)) => {
            Err(anyhow::Error::new(err).context("change kept in memory but not saved"))
        }
    }
}

enum CommandError {
    Input(InputError),
    Service(ServiceError),
}

impl From<InputError> for CommandError {
    fn from(value: InputError) -> Self {
        Self::Input(value)
    }
}

impl From<ServiceError> for CommandError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation(err) => Self::Input(InputError::from_validation(&err)),
            other => Self::Service(other),
        }
    }
}

fn run<R: PetRepository>(
    service: &mut PetService<R>,
    command: Commands,
) -> Result<(), CommandError> {
    match command {
        Commands::Status => {
            for line in render::dashboard(service.pet()) {
                println!("{line}");
            }
        }
        Commands::Vitals {
            heart_rate,
            respiration_rate,
            activity_minutes,
            scratch_count,
        } => {
            let vitals = input::parse_vitals(
                &heart_rate,
                &respiration_rate,
                &activity_minutes,
                &scratch_count,
            )?;
            service.record_vitals(
                vitals.heart_rate,
                vitals.respiration_rate,
                vitals.activity_minutes,
                vitals.scratch_count,
            )?;
            info!("event=cli_command module=cli status=ok command=vitals");
            for line in render::dashboard(service.pet()) {
                println!("{line}");
            }
        }
        Commands::Meal { name, amount } => {
            let amount = input::parse_amount(&amount)?;
            let entry = service.log_meal_today(&name, amount)?;
            println!("{}", render::meal_line(&entry));
            println!("{}", render::food_line(service.pet()));
        }
        Commands::Weight { weight_kg } => {
            let weight_kg = input::parse_weight(&weight_kg)?;
            let entry = service.log_weight_today(weight_kg)?;
            println!("{}", render::weight_line(&entry));
        }
        Commands::Groom { description } => {
            let entry = service.log_grooming_today(description)?;
            println!("{}", render::grooming_line(&entry));
        }
        Commands::Done { routine } => {
            let kind = input::parse_routine(&routine)?;
            let entry = service.complete_routine(kind)?;
            println!("{}", render::grooming_line(&entry));
            println!("{}", service.pet().routine(kind).status_text());
        }
        Commands::Settings {
            activity_target,
            optimal_weight,
            food_target,
            intervals,
        } => {
            let parsed = input::parse_settings(
                activity_target.as_deref(),
                optimal_weight.as_deref(),
                food_target.as_deref(),
                &intervals,
            )?;
            let current = service.pet().targets();
            let update = SettingsUpdate {
                target_activity_minutes: parsed
                    .target_activity_minutes
                    .unwrap_or(i64::from(current.activity_minutes)),
                optimal_weight_kg: parsed.optimal_weight_kg.unwrap_or(current.optimal_weight_kg),
                target_food_amount: parsed.target_food_amount.unwrap_or(current.food_amount),
                intervals: parsed.intervals,
            };
            service.update_settings(&update)?;
            println!("Preferences updated.");
            for (_, routine) in service.pet().routines() {
                println!("{} every {} days", routine.task_name(), routine.interval_days());
            }
        }
        Commands::History => {
            let pet = service.pet();
            println!("Meals:");
            pet.meals()
                .iter()
                .for_each(|entry| println!("  {}", render::meal_line(entry)));
            println!("Weights:");
            pet.weights()
                .iter()
                .for_each(|entry| println!("  {}", render::weight_line(entry)));
            println!("Grooming:");
            pet.grooming_log()
                .iter()
                .for_each(|entry| println!("  {}", render::grooming_line(entry)));
            println!("Activity:");
            for line in render::activity_history(&pet.daily_activity_snapshot()) {
                println!("  {line}");
            }
        }
    }
    Ok(())
}
