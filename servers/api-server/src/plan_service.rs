//! Plan Service: request handlers' business logic —
//! generate, latest, history, explain, simulate. Enforces idempotency by
//! plan-date, attaches generator identity, persists results.

use chrono::{NaiveDate, Utc};
use common::{AppError, CallerIdentity, Pagination};
use domain::model::{
    Alert, ConstraintAttribution, GeneratedBy, InductionPlan, OptimizationMetrics, PlanStatus,
    RankedEntry, SimulationParams,
};
use domain::{alert_generator, constraint_evaluator, simulator};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::AppState;

/// Lightweight summary attached to Generate/Latest responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub total_trains: u32,
    pub critical_alerts: u32,
    pub average_confidence: f64,
    pub status: PlanStatus,
}

impl PlanSummary {
    fn from_plan(plan: &InductionPlan) -> Self {
        Self {
            total_trains: plan.ranked_trains.len() as u32,
            critical_alerts: plan
                .alerts
                .iter()
                .filter(|a| matches!(a.alert_type, domain::model::AlertType::Critical))
                .count() as u32,
            average_confidence: plan.optimization_metrics.average_confidence,
            status: plan.status,
        }
    }
}

/// Lightweight projection used in `History`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanHistoryEntry {
    pub id: Uuid,
    pub plan_date: NaiveDate,
    pub generated_at: chrono::DateTime<Utc>,
    pub status: PlanStatus,
    pub total_trains: u32,
    pub average_confidence: f64,
    pub alerts: Vec<Alert>,
}

impl From<&InductionPlan> for PlanHistoryEntry {
    fn from(plan: &InductionPlan) -> Self {
        Self {
            id: plan.id,
            plan_date: plan.plan_date,
            generated_at: plan.generated_at,
            status: plan.status,
            total_trains: plan.ranked_trains.len() as u32,
            average_confidence: plan.optimization_metrics.average_confidence,
            alerts: plan.alerts.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestResponse {
    pub plan: InductionPlan,
    pub summary: PlanSummary,
    pub top_trains: Vec<RankedEntry>,
    pub critical_alerts: Vec<Alert>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub plans: Vec<PlanHistoryEntry>,
    pub pagination: Pagination,
}

/// Per-entry detail derived on read from the current Train. Absent when the referenced train has since been deleted.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailedAnalysis {
    pub fitness_valid: bool,
    pub maintenance_urgency: domain::model::MaintenanceUrgency,
    pub current_mileage: i64,
    pub has_branding: bool,
    pub branding_priority: u8,
    pub current_location: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationEntry {
    pub rank: u32,
    pub train: common::TrainRef,
    pub reasoning: String,
    pub confidence_score: u8,
    pub constraints: ConstraintAttribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_analysis: Option<DetailedAnalysis>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExplainResponse {
    pub plan: InductionPlan,
    pub explanations: Vec<ExplanationEntry>,
    pub optimization_metrics: OptimizationMetrics,
    pub ai_model_info: domain::model::AiModelInfo,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub plan_date: Option<NaiveDate>,
    #[serde(default)]
    pub force_regenerate: bool,
    #[serde(default)]
    pub constraints: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub plan: InductionPlan,
    pub summary: PlanSummary,
    pub processing_time: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResponse {
    pub existing_plan: InductionPlan,
    pub suggestion: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    pub train_id: String,
    pub modifications: simulator::TrainModifications,
    pub base_date: Option<NaiveDate>,
    #[serde(default)]
    pub constraints: serde_json::Value,
}

/// A transient, never-persisted SIMULATION-status plan shape (spec
/// §4.5, §4.6): like an `InductionPlan` but carrying an `impactAnalysis`
/// delta instead of a stored id.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub plan_date: NaiveDate,
    pub generated_at: chrono::DateTime<Utc>,
    pub status: PlanStatus,
    pub ranked_trains: Vec<RankedEntry>,
    pub alerts: Vec<Alert>,
    pub optimization_metrics: OptimizationMetrics,
    pub simulation_params: SimulationParams,
    pub ai_model_info: domain::model::AiModelInfo,
    pub impact_analysis: simulator::ImpactAnalysis,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub simulation: SimulationResult,
}

/// Result of `generate`: either a newly persisted plan, or a conflict
/// against a plan that already exists for the date.
pub enum GenerateOutcome {
    Created(GenerateResponse),
    Conflict(ConflictResponse),
}

/// `Generate(planDate, forceRegenerate, constraints)`.
pub async fn generate(
    state: &AppState,
    caller: &CallerIdentity,
    req: GenerateRequest,
) -> Result<GenerateOutcome, AppError> {
    let plan_date = req.plan_date.unwrap_or_else(|| Utc::now().date_naive());

    let lock = state.lock_for_date(plan_date).await;
    let _guard = lock.lock().await;

    if !req.force_regenerate {
        if let Some(existing) = state.plan_repo.find_finalized_by_date(plan_date).await? {
            return Ok(GenerateOutcome::Conflict(ConflictResponse {
                suggestion: format!(
                    "a finalized plan already exists for {plan_date}; pass forceRegenerate=true to create another"
                ),
                existing_plan: existing,
            }));
        }
    }

    let trains = state.train_repo.list().await?;
    if trains.is_empty() {
        return Err(AppError::BadRequest("no trains available to plan over".to_string()));
    }

    let now = Utc::now();
    let (result, used_fallback) =
        optimizer_client::optimize_with_fallback(&state.optimizer_client, &trains, &req.constraints, now).await;
    if used_fallback {
        metrics::counter!("induction_optimizer_fallback_total", 1);
    }
    let alerts = alert_generator::generate(&trains, now);

    let plan = InductionPlan {
        id: Uuid::new_v4(),
        plan_date,
        generated_at: now,
        status: PlanStatus::Finalized,
        ranked_trains: result.ranked_trains,
        alerts,
        optimization_metrics: result.metrics,
        simulation_params: None,
        generated_by: GeneratedBy {
            caller_id: caller.caller_id.clone(),
            display_name: caller.display_name.clone(),
        },
        ai_model_info: result.model_info,
    };

    state.plan_repo.insert(&plan).await?;
    metrics::counter!("induction_plans_generated_total", 1);
    metrics::counter!("induction_alerts_emitted_total", plan.alerts.len() as u64);

    let processing_time = plan.optimization_metrics.processing_time_ms;
    Ok(GenerateOutcome::Created(GenerateResponse {
        summary: PlanSummary::from_plan(&plan),
        plan,
        processing_time,
    }))
}

/// `Latest()`: most recent FINALIZED plan.
pub async fn latest(state: &AppState) -> Result<LatestResponse, AppError> {
    let plan = state
        .plan_repo
        .get_latest()
        .await?
        .ok_or_else(|| AppError::NotFound("no plan has been generated yet".to_string()))?;

    let top_trains = plan.ranked_trains.iter().take(5).cloned().collect();
    let critical_alerts = plan
        .alerts
        .iter()
        .filter(|a| matches!(a.alert_type, domain::model::AlertType::Critical))
        .cloned()
        .collect();

    Ok(LatestResponse {
        summary: PlanSummary::from_plan(&plan),
        top_trains,
        critical_alerts,
        plan,
    })
}

/// `History(limit, page)`: newest-first, lightweight projection.
pub async fn history(state: &AppState, page_query: common::PageQuery) -> Result<HistoryResponse, AppError> {
    let page_query = page_query.normalized();
    let (plans, total) = state
        .plan_repo
        .get_history(page_query.limit as i64, page_query.offset())
        .await?;

    Ok(HistoryResponse {
        plans: plans.iter().map(PlanHistoryEntry::from).collect(),
        pagination: db::plan_repository::paginate(total, page_query.limit as i64, page_query.offset()),
    })
}

/// `Explain(planId)`: full plan with per-entry detail
/// derived on read from the current Train state.
pub async fn explain(state: &AppState, plan_id: Uuid) -> Result<ExplainResponse, AppError> {
    let plan = state
        .plan_repo
        .get_by_id(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no plan found with id {plan_id}")))?;

    let now = Utc::now();
    let mut explanations = Vec::with_capacity(plan.ranked_trains.len());
    for entry in &plan.ranked_trains {
        let detailed_analysis = match state.train_repo.get(entry.train_ref.id).await? {
            Some(train) => {
                let eval = constraint_evaluator::evaluate(&train, now);
                Some(DetailedAnalysis {
                    fitness_valid: eval.fitness_valid,
                    maintenance_urgency: eval.maintenance_urgency,
                    current_mileage: train.operational.current_mileage,
                    has_branding: train.branding.has_branding,
                    branding_priority: train.branding.priority,
                    current_location: train.operational.current_location,
                })
            }
            None => None,
        };

        explanations.push(ExplanationEntry {
            rank: entry.rank,
            train: entry.train_ref.clone(),
            reasoning: entry.reasoning.clone(),
            confidence_score: entry.confidence_score,
            constraints: entry.constraints.clone(),
            detailed_analysis,
        });
    }

    Ok(ExplainResponse {
        optimization_metrics: plan.optimization_metrics,
        ai_model_info: plan.ai_model_info.clone(),
        alerts: plan.alerts.clone(),
        explanations,
        plan,
    })
}

/// `Simulate(targetTrainRef, modifications, baseDate?, constraints)`
///: never persisted.
pub async fn simulate(state: &AppState, req: SimulateRequest) -> Result<SimulateResponse, AppError> {
    let trains = state.train_repo.list().await?;
    let now = Utc::now();

    let outcome = simulator::simulate(&trains, &req.train_id, &req.modifications, &req.constraints, now)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    let target = trains
        .iter()
        .find(|t| t.code == req.train_id || t.id.to_string() == req.train_id)
        .expect("simulator::simulate already validated the target exists");

    metrics::counter!("induction_simulations_total", 1);

    let simulation = SimulationResult {
        plan_date: req.base_date.unwrap_or_else(|| now.date_naive()),
        generated_at: now,
        status: PlanStatus::Simulation,
        ranked_trains: outcome.ranked_trains,
        alerts: outcome.alerts,
        optimization_metrics: outcome.metrics,
        simulation_params: SimulationParams {
            target_train: target.train_ref(),
            modifications: serde_json::to_value(&req.modifications).unwrap_or(serde_json::Value::Null),
        },
        ai_model_info: outcome.model_info,
        impact_analysis: outcome.impact_analysis,
    };

    Ok(SimulateResponse { simulation })
}
