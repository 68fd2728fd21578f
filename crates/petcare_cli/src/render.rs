//! Text rendering for dashboard and log views.

use chrono::NaiveDate;
use petcare_core::{GroomingEntry, MealEntry, PetState, WeightEntry};
use std::collections::BTreeMap;

/// Decimal amounts always show a fractional part (`2.0`, not `2`).
fn decimal(value: f64) -> String {
    format!("{value:?}")
}

pub fn meal_line(entry: &MealEntry) -> String {
    format!("{} | {}: {}", entry.date, entry.name, decimal(entry.amount))
}

pub fn weight_line(entry: &WeightEntry) -> String {
    format!("{}: {} kg", entry.date, decimal(entry.weight_kg))
}

pub fn grooming_line(entry: &GroomingEntry) -> String {
    format!("{}: {}", entry.date, entry.description)
}

/// Activity history, most recent day first.
pub fn activity_history(snapshot: &BTreeMap<NaiveDate, u32>) -> Vec<String> {
    snapshot
        .iter()
        .rev()
        .map(|(date, minutes)| format!("{date}: {minutes} mins"))
        .collect()
}

/// Share of the activity goal reached, capped at 1.0; 0.0 when no goal is set.
pub fn activity_progress(activity_minutes: u32, target_minutes: u32) -> f64 {
    if target_minutes == 0 {
        return 0.0;
    }
    (f64::from(activity_minutes) / f64::from(target_minutes)).min(1.0)
}

/// Blocking care alert body, or `None` when nothing is due.
pub fn care_due_alert(due: &[String]) -> Option<String> {
    if due.is_empty() {
        return None;
    }
    let mut body = String::from("Action Required:\n");
    for name in due {
        body.push_str("- ");
        body.push_str(name);
        body.push('\n');
    }
    Some(body)
}

/// Today's food intake against the daily target.
pub fn food_line(pet: &PetState) -> String {
    format!(
        "Food: {} / {}",
        decimal(pet.today_food_total()),
        decimal(pet.targets().food_amount)
    )
}

pub fn dashboard(pet: &PetState) -> Vec<String> {
    let vitals = pet.vitals();
    let targets = pet.targets();
    let progress = activity_progress(vitals.activity_minutes, targets.activity_minutes);

    let mut lines = vec![
        format!("{} ({})", pet.name(), pet.today()),
        format!("Heart rate: {} bpm", vitals.heart_rate),
        format!("Respiration: {} /min", vitals.respiration_rate),
        format!(
            "Activity: {} / {} mins ({:.0}%)",
            vitals.activity_minutes,
            targets.activity_minutes,
            progress * 100.0
        ),
        format!("Scratches: {}", vitals.scratch_count),
        food_line(pet),
        format!("Optimal weight: {} kg", decimal(targets.optimal_weight_kg)),
        String::new(),
    ];
    lines.extend(pet.routines().map(|(_, routine)| routine.status_text()));
    lines
}
