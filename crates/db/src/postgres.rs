//! Postgres-backed repository implementations.
//!
//! Nested record fields (`fitness`, `maintenance`, `rankedTrains`, ...)
//! are stored as `jsonb` columns alongside the scalar columns the
//! planning engine actually queries on (`code`, `plan_date`, `status`).
//! rather than normalizing every nested record into its own table.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use domain::{Alert, GeneratedBy, InductionPlan, OptimizationMetrics, PlanStatus, RankedEntry, Train};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::DbError;
use crate::plan_repository::PlanRepository;
use crate::train_repository::TrainRepository;
use crate::DbPool;

#[derive(Clone)]
pub struct PgTrainRepository {
    pool: DbPool,
}

impl PgTrainRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TrainRow {
    id: Uuid,
    code: String,
    fitness: serde_json::Value,
    maintenance: serde_json::Value,
    cleaning: serde_json::Value,
    operational: serde_json::Value,
    branding: serde_json::Value,
    performance_score: f64,
    reliability_score: f64,
}

impl TryFrom<TrainRow> for Train {
    type Error = DbError;

    fn try_from(row: TrainRow) -> Result<Self, Self::Error> {
        Ok(Train {
            id: row.id,
            code: row.code,
            fitness: serde_json::from_value(row.fitness)
                .map_err(|e| DbError::Corrupt(format!("fitness: {e}")))?,
            maintenance: serde_json::from_value(row.maintenance)
                .map_err(|e| DbError::Corrupt(format!("maintenance: {e}")))?,
            cleaning: serde_json::from_value(row.cleaning)
                .map_err(|e| DbError::Corrupt(format!("cleaning: {e}")))?,
            operational: serde_json::from_value(row.operational)
                .map_err(|e| DbError::Corrupt(format!("operational: {e}")))?,
            branding: serde_json::from_value(row.branding)
                .map_err(|e| DbError::Corrupt(format!("branding: {e}")))?,
            performance_score: row.performance_score,
            reliability_score: row.reliability_score,
        })
    }
}

#[async_trait]
impl TrainRepository for PgTrainRepository {
    async fn list(&self) -> Result<Vec<Train>, DbError> {
        let rows: Vec<TrainRow> = sqlx::query_as(
            "SELECT id, code, fitness, maintenance, cleaning, operational, branding, \
             performance_score, reliability_score FROM trains ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Train::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Train>, DbError> {
        let row: Option<TrainRow> = sqlx::query_as(
            "SELECT id, code, fitness, maintenance, cleaning, operational, branding, \
             performance_score, reliability_score FROM trains WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Train::try_from).transpose()
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Train>, DbError> {
        let row: Option<TrainRow> = sqlx::query_as(
            "SELECT id, code, fitness, maintenance, cleaning, operational, branding, \
             performance_score, reliability_score FROM trains WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Train::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PgPlanRepository {
    pool: DbPool,
}

impl PgPlanRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PlanRow {
    id: Uuid,
    plan_date: NaiveDate,
    generated_at: DateTime<Utc>,
    status: String,
    ranked_trains: serde_json::Value,
    alerts: serde_json::Value,
    optimization_metrics: serde_json::Value,
    simulation_params: Option<serde_json::Value>,
    generated_by: serde_json::Value,
    ai_model_info: serde_json::Value,
}

impl TryFrom<PlanRow> for InductionPlan {
    type Error = DbError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let status: PlanStatus = serde_json::from_value(serde_json::Value::String(row.status))
            .map_err(|e| DbError::Corrupt(format!("status: {e}")))?;
        let ranked_trains: Vec<RankedEntry> = serde_json::from_value(row.ranked_trains)
            .map_err(|e| DbError::Corrupt(format!("ranked_trains: {e}")))?;
        let alerts: Vec<Alert> =
            serde_json::from_value(row.alerts).map_err(|e| DbError::Corrupt(format!("alerts: {e}")))?;
        let optimization_metrics: OptimizationMetrics = serde_json::from_value(row.optimization_metrics)
            .map_err(|e| DbError::Corrupt(format!("optimization_metrics: {e}")))?;
        let simulation_params = row
            .simulation_params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| DbError::Corrupt(format!("simulation_params: {e}")))?;
        let generated_by: GeneratedBy = serde_json::from_value(row.generated_by)
            .map_err(|e| DbError::Corrupt(format!("generated_by: {e}")))?;
        let ai_model_info = serde_json::from_value(row.ai_model_info)
            .map_err(|e| DbError::Corrupt(format!("ai_model_info: {e}")))?;

        Ok(InductionPlan {
            id: row.id,
            plan_date: row.plan_date,
            generated_at: row.generated_at,
            status,
            ranked_trains,
            alerts,
            optimization_metrics,
            simulation_params,
            generated_by,
            ai_model_info,
        })
    }
}

const PLAN_COLUMNS: &str = "id, plan_date, generated_at, status, ranked_trains, alerts, \
     optimization_metrics, simulation_params, generated_by, ai_model_info";

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn get_latest(&self) -> Result<Option<InductionPlan>, DbError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE status = 'FINALIZED' \
             ORDER BY plan_date DESC, generated_at DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.map(InductionPlan::try_from).transpose()
    }

    async fn get_history(&self, limit: i64, offset: i64) -> Result<(Vec<InductionPlan>, i64), DbError> {
        let rows: Vec<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE status = 'FINALIZED' \
             ORDER BY plan_date DESC, generated_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM plans WHERE status = 'FINALIZED'")
            .fetch_one(&self.pool)
            .await?;

        let plans = rows.into_iter().map(InductionPlan::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok((plans, total.0))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<InductionPlan>, DbError> {
        let row: Option<PlanRow> =
            sqlx::query_as(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(InductionPlan::try_from).transpose()
    }

    async fn find_finalized_by_date(&self, plan_date: NaiveDate) -> Result<Option<InductionPlan>, DbError> {
        let row: Option<PlanRow> = sqlx::query_as(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE plan_date = $1 AND status = 'FINALIZED'"
        ))
        .bind(plan_date)
        .fetch_optional(&self.pool)
        .await?;
        row.map(InductionPlan::try_from).transpose()
    }

    /// No duplicate-date rejection at this layer: forceRegenerate
    /// legitimately inserts a second FINALIZED row for a plan_date that
    /// already has one. Idempotency for non-forced calls is enforced by
    /// the Plan Service's pre-check under its per-plan_date advisory lock.
    async fn insert(&self, plan: &InductionPlan) -> Result<(), DbError> {
        let status = serde_json::to_value(plan.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        sqlx::query(
            "INSERT INTO plans (id, plan_date, generated_at, status, ranked_trains, alerts, \
             optimization_metrics, simulation_params, generated_by, ai_model_info) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(plan.id)
        .bind(plan.plan_date)
        .bind(plan.generated_at)
        .bind(status)
        .bind(serde_json::to_value(&plan.ranked_trains).unwrap_or_default())
        .bind(serde_json::to_value(&plan.alerts).unwrap_or_default())
        .bind(serde_json::to_value(plan.optimization_metrics).unwrap_or_default())
        .bind(plan.simulation_params.as_ref().and_then(|p| serde_json::to_value(p).ok()))
        .bind(serde_json::to_value(&plan.generated_by).unwrap_or_default())
        .bind(serde_json::to_value(&plan.ai_model_info).unwrap_or_default())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
