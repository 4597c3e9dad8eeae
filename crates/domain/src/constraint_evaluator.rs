//! Constraint Evaluator: a pure function over one `Train`.

use chrono::{DateTime, Utc};

use crate::model::{EvaluatedConstraints, MaintenanceState, MaintenanceUrgency, Train};

const SECS_PER_DAY: i64 = 86_400;

/// Evaluate the derived state of a single train against a reference time.
/// No I/O; safe to call from any number of concurrent tasks.
pub fn evaluate(train: &Train, now: DateTime<Utc>) -> EvaluatedConstraints {
    let fitness_valid = train.fitness.valid && train.fitness.expiry > now;
    let days_to_expiry = (train.fitness.expiry - now).num_seconds().div_euclid(SECS_PER_DAY);

    let maintenance_due = train.maintenance.next_maintenance_due <= now
        || train.maintenance.status == MaintenanceState::MaintenanceDue;

    let maintenance_ready = train.maintenance.status == MaintenanceState::Operational && !maintenance_due;

    let days_to_maintenance = (train.maintenance.next_maintenance_due - now)
        .num_seconds()
        .div_euclid(SECS_PER_DAY);
    let maintenance_urgency = if days_to_maintenance <= 0 {
        MaintenanceUrgency::Critical
    } else if days_to_maintenance <= 3 {
        MaintenanceUrgency::High
    } else if days_to_maintenance <= 7 {
        MaintenanceUrgency::Medium
    } else {
        MaintenanceUrgency::Low
    };

    let cleaning_ready = train.cleaning.status == crate::model::CleaningState::Clean;

    let hard_eligible = fitness_valid
        && train.maintenance.status == MaintenanceState::Operational
        && train.operational.available_for_service;

    EvaluatedConstraints {
        fitness_valid,
        days_to_expiry,
        maintenance_due,
        maintenance_ready,
        maintenance_urgency,
        cleaning_ready,
        hard_eligible,
    }
}
