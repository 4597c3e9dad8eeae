//! Core data model: `Train` and `InductionPlan`.

use chrono::{DateTime, NaiveDate, Utc};
use common::TrainRef;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Maintenance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceState {
    Operational,
    MaintenanceDue,
    InMaintenance,
}

/// Cleaning status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CleaningState {
    Clean,
    CleaningDue,
    InCleaning,
}

/// Derived maintenance urgency bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceUrgency {
    Low,
    Medium,
    High,
    Critical,
}

/// Fitness certificate state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Fitness {
    pub valid: bool,
    pub expiry: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_inspection: Option<DateTime<Utc>>,
}

/// Maintenance record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Maintenance {
    pub status: MaintenanceState,
    pub last_maintenance: DateTime<Utc>,
    pub next_maintenance_due: DateTime<Utc>,
}

/// Cleaning record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cleaning {
    pub status: CleaningState,
}

/// Operational readiness record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Operational {
    #[validate(range(min = 0))]
    pub current_mileage: i64,
    pub current_location: String,
    pub available_for_service: bool,
    #[validate(range(min = 0.0))]
    pub total_operational_hours: f64,
}

/// Branding obligation record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub has_branding: bool,
    #[serde(default)]
    pub campaign: String,
    /// Defaults to 1 for unbranded trains.
    #[validate(range(min = 1, max = 5))]
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_priority() -> u8 {
    1
}

/// One physical trainset.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    pub id: Uuid,
    /// Must match `^TS-\d{2}$`; checked by `Train::has_valid_code`, not by
    /// the `Validate` derive (the trainset-code pattern needs a shared
    /// compiled regex rather than a per-call literal).
    pub code: String,
    pub fitness: Fitness,
    pub maintenance: Maintenance,
    pub cleaning: Cleaning,
    pub operational: Operational,
    pub branding: Branding,
    /// Upstream telemetry input; defaults to 0.0 when absent.
    #[serde(default)]
    pub performance_score: f64,
    #[serde(default)]
    pub reliability_score: f64,
}

static TRAIN_CODE_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"^TS-\d{2}$").expect("valid regex"));

impl Train {
    pub fn train_ref(&self) -> TrainRef {
        TrainRef::new(self.id, self.code.clone())
    }

    pub fn has_valid_code(&self) -> bool {
        TRAIN_CODE_RE.is_match(&self.code)
    }
}

/// Result of the Constraint Evaluator. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedConstraints {
    pub fitness_valid: bool,
    pub days_to_expiry: i64,
    pub maintenance_due: bool,
    pub maintenance_ready: bool,
    pub maintenance_urgency: MaintenanceUrgency,
    pub cleaning_ready: bool,
    pub hard_eligible: bool,
}

/// Plan lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanStatus {
    Draft,
    Finalized,
    Simulation,
}

/// Alert severity/category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertType {
    Critical,
    Warning,
    Info,
}

/// One alert emitted by the Alert Generator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub train_code: String,
    /// 1 (lowest) to 5 (highest).
    pub severity: u8,
}

/// Per-constraint attribution carried on a ranked entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintAttribution {
    pub fitness_valid: bool,
    pub maintenance_ready: bool,
    pub cleaning_status: CleaningState,
    pub branding_priority: u8,
    /// Signed deviation from fleet mean mileage, in km.
    pub mileage_balance: f64,
}

/// One entry in a ranked induction plan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub train_ref: TrainRef,
    /// 1-based, dense, unique within a plan.
    pub rank: u32,
    pub reasoning: String,
    /// Clamped to [60, 100].
    pub confidence_score: u8,
    pub constraints: ConstraintAttribution,
}

/// Aggregate metrics attached to a plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationMetrics {
    pub total_trains_evaluated: u32,
    pub constraints_satisfied: u32,
    pub average_confidence: f64,
    pub processing_time_ms: u64,
}

/// Identity of whoever generated a plan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBy {
    pub caller_id: String,
    pub display_name: String,
}

/// Model/algorithm provenance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiModelInfo {
    pub version: String,
    pub algorithm: String,
    pub parameters: serde_json::Value,
}

impl AiModelInfo {
    pub fn local_fallback(parameters: serde_json::Value) -> Self {
        Self {
            version: "1.0-fallback".to_string(),
            algorithm: "Rule-Based Weighted Scoring".to_string(),
            parameters,
        }
    }
}

/// Parameters recorded when a plan is a simulation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParams {
    pub target_train: TrainRef,
    pub modifications: serde_json::Value,
}

/// Immutable record of one planning decision.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InductionPlan {
    #[serde(default)]
    pub id: Uuid,
    pub plan_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub status: PlanStatus,
    pub ranked_trains: Vec<RankedEntry>,
    pub alerts: Vec<Alert>,
    pub optimization_metrics: OptimizationMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation_params: Option<SimulationParams>,
    pub generated_by: GeneratedBy,
    pub ai_model_info: AiModelInfo,
}

/// Output of the Optimizer, before it is wrapped into a plan.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub ranked_trains: Vec<RankedEntry>,
    pub metrics: OptimizationMetrics,
    pub model_info: AiModelInfo,
}
