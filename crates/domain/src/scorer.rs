//! Scorer: a pure function over `(Train, EvaluatedConstraints,
//! FleetContext)` producing a numeric score and a reproducible reasoning
//! trace. Reasoning phrasing is part of the wire contract — do
//! not reword without updating the end-to-end scenarios in lock-step.

use chrono::{DateTime, Utc};

use crate::model::{CleaningState, EvaluatedConstraints, MaintenanceState, Train};

/// Fleet-wide context shared by every per-train score computation.
#[derive(Debug, Clone, Copy)]
pub struct FleetContext {
    pub mean_mileage: f64,
    pub now: DateTime<Utc>,
}

impl FleetContext {
    pub fn from_pool(trains: &[&Train], now: DateTime<Utc>) -> Self {
        let mean_mileage = if trains.is_empty() {
            0.0
        } else {
            trains.iter().map(|t| t.operational.current_mileage as f64).sum::<f64>() / trains.len() as f64
        };
        Self { mean_mileage, now }
    }
}

/// Result of scoring a single train.
#[derive(Debug, Clone)]
pub struct ScoredTrain {
    pub score: f64,
    pub confidence: u8,
    pub reasoning: String,
    pub mileage_balance: f64,
}

/// Score one train given its evaluated constraints and fleet context.
pub fn score(train: &Train, eval: &EvaluatedConstraints, ctx: &FleetContext) -> ScoredTrain {
    let mut total = 0.0_f64;
    let mut phrases: Vec<String> = Vec::new();

    if eval.fitness_valid {
        total += 30.0;
        phrases.push("Valid fitness certificate".to_string());
    }

    if train.maintenance.status == MaintenanceState::Operational {
        total += 25.0;
        phrases.push("Operational status confirmed".to_string());
        if !eval.maintenance_due {
            total += 10.0;
            phrases.push("No maintenance due".to_string());
        }
    }

    let mileage_delta = train.operational.current_mileage as f64 - ctx.mean_mileage;
    let mileage_term = (15.0 - mileage_delta.abs() / 1000.0).max(0.0);
    total += mileage_term;
    if mileage_term > 0.0 {
        phrases.push(format!(
            "Current mileage: {}km",
            format_thousands(train.operational.current_mileage)
        ));
    }

    if train.branding.has_branding {
        let bonus = 2.0 * train.branding.priority as f64;
        total += bonus;
        phrases.push(format!("Branding priority: {}/5", train.branding.priority));
    }

    let perf_reliability = 0.1 * train.performance_score + 0.1 * train.reliability_score;
    total += perf_reliability;
    if train.performance_score > 0.0 {
        phrases.push(format!("Performance score: {}", train.performance_score));
    }
    if train.reliability_score > 0.0 {
        phrases.push(format!("Reliability score: {}", train.reliability_score));
    }

    if train.cleaning.status == CleaningState::Clean {
        total += 5.0;
        phrases.push("Clean and ready for service".to_string());
    }

    let rounded = total.round() as i64;
    phrases.push(format!("Overall optimization score: {rounded}"));
    let reasoning = phrases.join("; ");

    let confidence = rounded.clamp(60, 100) as u8;

    ScoredTrain {
        score: total,
        confidence,
        reasoning,
        mileage_balance: mileage_delta,
    }
}

fn format_thousands(n: i64) -> String {
    let s = n.abs().to_string();
    let mut out = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    let mut result: String = out.chars().rev().collect();
    if n < 0 {
        result.insert(0, '-');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint_evaluator::evaluate;
    use crate::model::{Branding, Cleaning, Fitness, Maintenance, Operational};
    use chrono::Duration;
    use uuid::Uuid;

    fn train(mileage: i64, priority: u8, has_branding: bool, now: DateTime<Utc>) -> Train {
        Train {
            id: Uuid::new_v4(),
            code: "TS-01".into(),
            fitness: Fitness {
                valid: true,
                expiry: now + Duration::days(30),
                last_inspection: None,
            },
            maintenance: Maintenance {
                status: MaintenanceState::Operational,
                last_maintenance: now - Duration::days(10),
                next_maintenance_due: now + Duration::days(30),
            },
            cleaning: Cleaning {
                status: CleaningState::Clean,
            },
            operational: Operational {
                current_mileage: mileage,
                current_location: "Depot A".into(),
                available_for_service: true,
                total_operational_hours: 1000.0,
            },
            branding: Branding {
                has_branding,
                campaign: "Metro Ads".into(),
                priority,
            },
            performance_score: 0.0,
            reliability_score: 0.0,
        }
    }

    #[test]
    fn confidence_is_clamped_to_60_100() {
        let now = Utc::now();
        let t = train(5000, 1, false, now);
        let eval = evaluate(&t, now);
        let ctx = FleetContext {
            mean_mileage: 5000.0,
            now,
        };
        let result = score(&t, &eval, &ctx);
        assert!(result.confidence >= 60 && result.confidence <= 100);
    }

    #[test]
    fn reasoning_contains_contract_phrases() {
        let now = Utc::now();
        let t = train(4850, 4, true, now);
        let eval = evaluate(&t, now);
        let ctx = FleetContext {
            mean_mileage: 4850.0,
            now,
        };
        let result = score(&t, &eval, &ctx);
        assert!(result.reasoning.contains("Current mileage: 4,850km"));
        assert!(result.reasoning.contains("Branding priority: 4/5"));
        assert!(result.reasoning.contains("Overall optimization score:"));
    }

    #[test]
    fn branding_bonus_scales_with_priority() {
        let now = Utc::now();
        let ctx = FleetContext {
            mean_mileage: 5000.0,
            now,
        };
        let low = train(5000, 1, true, now);
        let high = train(5000, 5, true, now);
        let low_score = score(&low, &evaluate(&low, now), &ctx).score;
        let high_score = score(&high, &evaluate(&high, now), &ctx).score;
        assert!(high_score > low_score);
    }
}
