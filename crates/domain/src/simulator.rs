//! Simulator: applies a hypothetical modification to one
//! train and reruns the Optimizer, producing an impact-analysis delta.
//! Never persists anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::alert_generator;
use crate::model::{
    Alert, CleaningState, MaintenanceState, OptimizationMetrics, Train,
};
use crate::optimizer;

/// Errors specific to simulation (mapped to `AppError::NotFound` at the
/// service boundary).
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("train not found: {0}")]
    TrainNotFound(String),
}

/// A shallow, field-wise overlay applied to one train.
/// Every field is optional; `Some` overwrites, `None` leaves the original
/// value untouched. Nested records (fitness/maintenance/cleaning/
/// operational/branding) merge field-by-field, not wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainModifications {
    #[serde(default)]
    pub fitness: Option<FitnessPatch>,
    #[serde(default)]
    pub maintenance: Option<MaintenancePatch>,
    #[serde(default)]
    pub cleaning: Option<CleaningPatch>,
    #[serde(default)]
    pub operational: Option<OperationalPatch>,
    #[serde(default)]
    pub branding: Option<BrandingPatch>,
    #[serde(default)]
    pub performance_score: Option<f64>,
    #[serde(default)]
    pub reliability_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FitnessPatch {
    pub valid: Option<bool>,
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenancePatch {
    pub status: Option<MaintenanceState>,
    pub next_maintenance_due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleaningPatch {
    pub status: Option<CleaningState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationalPatch {
    pub current_mileage: Option<i64>,
    pub available_for_service: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrandingPatch {
    pub has_branding: Option<bool>,
    pub campaign: Option<String>,
    pub priority: Option<u8>,
}

/// Apply a shallow overlay to a copy of `train`.
pub fn apply_modifications(train: &Train, modifications: &TrainModifications) -> Train {
    let mut t = train.clone();

    if let Some(p) = &modifications.fitness {
        if let Some(v) = p.valid {
            t.fitness.valid = v;
        }
        if let Some(v) = p.expiry {
            t.fitness.expiry = v;
        }
    }
    if let Some(p) = &modifications.maintenance {
        if let Some(v) = p.status {
            t.maintenance.status = v;
        }
        if let Some(v) = p.next_maintenance_due {
            t.maintenance.next_maintenance_due = v;
        }
    }
    if let Some(p) = &modifications.cleaning {
        if let Some(v) = p.status {
            t.cleaning.status = v;
        }
    }
    if let Some(p) = &modifications.operational {
        if let Some(v) = p.current_mileage {
            t.operational.current_mileage = v;
        }
        if let Some(v) = p.available_for_service {
            t.operational.available_for_service = v;
        }
    }
    if let Some(p) = &modifications.branding {
        if let Some(v) = p.has_branding {
            t.branding.has_branding = v;
        }
        if let Some(v) = &p.campaign {
            t.branding.campaign = v.clone();
        }
        if let Some(v) = p.priority {
            t.branding.priority = v;
        }
    }
    if let Some(v) = modifications.performance_score {
        t.performance_score = v;
    }
    if let Some(v) = modifications.reliability_score {
        t.reliability_score = v;
    }

    t
}

/// Impact analysis comparing the target train's placement before/after
/// the hypothetical modification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysis {
    pub new_rank: Option<u32>,
    pub rank_change: String,
    pub affected_trains: u32,
}

/// Full output of a simulation run.
pub struct SimulationOutcome {
    pub ranked_trains: Vec<crate::model::RankedEntry>,
    pub alerts: Vec<Alert>,
    pub metrics: OptimizationMetrics,
    pub model_info: crate::model::AiModelInfo,
    pub impact_analysis: ImpactAnalysis,
}

/// Locate a train by opaque id or human code.
fn find_target<'a>(trains: &'a [Train], target_ref: &str) -> Option<&'a Train> {
    trains
        .iter()
        .find(|t| t.code == target_ref || t.id.to_string() == target_ref)
}

/// Run a what-if simulation: overlay `modifications` onto `target_ref`'s
/// train and rerun the Optimizer over the resulting fleet.
pub fn simulate(
    trains: &[Train],
    target_ref: &str,
    modifications: &TrainModifications,
    constraints: &serde_json::Value,
    now: DateTime<Utc>,
) -> Result<SimulationOutcome, SimulatorError> {
    let target = find_target(trains, target_ref)
        .ok_or_else(|| SimulatorError::TrainNotFound(target_ref.to_string()))?;
    let target_id = target.id;

    let modified: Vec<Train> = trains
        .iter()
        .map(|t| {
            if t.id == target_id {
                apply_modifications(t, modifications)
            } else {
                t.clone()
            }
        })
        .collect();

    let result = optimizer::optimize(&modified, constraints, now);
    let alerts = alert_generator::generate(&modified, now);

    let new_rank = result
        .ranked_trains
        .iter()
        .find(|e| e.train_ref.id == target_id)
        .map(|e| e.rank);

    let rank_change = match new_rank {
        Some(rank) => format!("Moved to rank {rank}"),
        None => "Not in top rankings".to_string(),
    };

    let impact_analysis = ImpactAnalysis {
        new_rank,
        rank_change,
        affected_trains: result.ranked_trains.len() as u32,
    };

    Ok(SimulationOutcome {
        ranked_trains: result.ranked_trains,
        alerts,
        metrics: result.metrics,
        model_info: result.model_info,
        impact_analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Branding, Cleaning, Fitness, Maintenance, Operational};
    use chrono::Duration;
    use uuid::Uuid;

    fn make_train(code: &str, mileage: i64, priority: u8, has_branding: bool, now: DateTime<Utc>) -> Train {
        Train {
            id: Uuid::new_v4(),
            code: code.into(),
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

    /// Scenario 5: branding bump promotes TS-02 to rank 1 via
    /// the tie-break on trainset code.
    #[test]
    fn simulation_promotes_target_via_branding_tie_break() {
        let now = Utc::now();
        let trains = vec![
            make_train("TS-01", 5000, 3, true, now),
            make_train("TS-02", 5200, 1, false, now),
            make_train("TS-03", 4800, 5, true, now),
        ];

        let modifications = TrainModifications {
            branding: Some(BrandingPatch {
                has_branding: Some(true),
                campaign: None,
                priority: Some(5),
            }),
            ..Default::default()
        };

        let outcome = simulate(&trains, "TS-02", &modifications, &serde_json::Value::Null, now).unwrap();
        assert_eq!(outcome.impact_analysis.new_rank, Some(1));
        assert!(outcome.impact_analysis.rank_change.contains("Moved to rank 1"));
    }

    #[test]
    fn simulation_errors_on_missing_target() {
        let now = Utc::now();
        let trains = vec![make_train("TS-01", 5000, 1, false, now)];
        let result = simulate(
            &trains,
            "TS-99",
            &TrainModifications::default(),
            &serde_json::Value::Null,
            now,
        );
        assert!(matches!(result, Err(SimulatorError::TrainNotFound(_))));
    }

    #[test]
    fn modifications_do_not_affect_other_trains() {
        let now = Utc::now();
        let trains = vec![
            make_train("TS-01", 5000, 3, true, now),
            make_train("TS-02", 5200, 1, false, now),
        ];
        let modifications = TrainModifications {
            operational: Some(OperationalPatch {
                current_mileage: Some(9000),
                available_for_service: None,
            }),
            ..Default::default()
        };
        let outcome = simulate(&trains, "TS-01", &modifications, &serde_json::Value::Null, now).unwrap();
        let ts02 = outcome
            .ranked_trains
            .iter()
            .find(|e| e.train_ref.code.as_deref() == Some("TS-02"))
            .unwrap();
        assert_eq!(ts02.constraints.mileage_balance, 5200.0 - (5200.0 + 9000.0) / 2.0);
    }
}
