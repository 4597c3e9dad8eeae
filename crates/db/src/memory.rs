//! In-memory repository implementations: used by integration tests and
//! anywhere a scratch fleet is needed without a live database (the
//! Simulator's modified-fleet copy never touches these — it stays
//! entirely in `domain`).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{InductionPlan, PlanStatus, Train};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::DbError;
use crate::plan_repository::PlanRepository;
use crate::train_repository::TrainRepository;

#[derive(Clone, Default)]
pub struct InMemoryTrainRepository {
    trains: Arc<RwLock<Vec<Train>>>,
}

impl InMemoryTrainRepository {
    pub fn new(trains: Vec<Train>) -> Self {
        Self {
            trains: Arc::new(RwLock::new(trains)),
        }
    }

    pub async fn seed(&self, trains: Vec<Train>) {
        *self.trains.write().await = trains;
    }
}

#[async_trait]
impl TrainRepository for InMemoryTrainRepository {
    async fn list(&self) -> Result<Vec<Train>, DbError> {
        Ok(self.trains.read().await.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Train>, DbError> {
        Ok(self.trains.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Train>, DbError> {
        Ok(self.trains.read().await.iter().find(|t| t.code == code).cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPlanRepository {
    plans: Arc<RwLock<Vec<InductionPlan>>>,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn get_latest(&self) -> Result<Option<InductionPlan>, DbError> {
        let plans = self.plans.read().await;
        Ok(plans
            .iter()
            .filter(|p| p.status == PlanStatus::Finalized)
            .max_by(|a, b| (a.plan_date, a.generated_at).cmp(&(b.plan_date, b.generated_at)))
            .cloned())
    }

    async fn get_history(&self, limit: i64, offset: i64) -> Result<(Vec<InductionPlan>, i64), DbError> {
        let plans = self.plans.read().await;
        let mut sorted: Vec<InductionPlan> =
            plans.iter().filter(|p| p.status == PlanStatus::Finalized).cloned().collect();
        sorted.sort_by(|a, b| (b.plan_date, b.generated_at).cmp(&(a.plan_date, a.generated_at)));
        let total = sorted.len() as i64;
        let page: Vec<InductionPlan> = sorted
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<InductionPlan>, DbError> {
        Ok(self.plans.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_finalized_by_date(&self, plan_date: NaiveDate) -> Result<Option<InductionPlan>, DbError> {
        Ok(self
            .plans
            .read()
            .await
            .iter()
            .find(|p| p.plan_date == plan_date && p.status == PlanStatus::Finalized)
            .cloned())
    }

    async fn insert(&self, plan: &InductionPlan) -> Result<(), DbError> {
        // No duplicate-date rejection here: forceRegenerate legitimately
        // inserts a second FINALIZED row for a plan_date that already has
        // one. Idempotency for non-forced calls is enforced by the Plan
        // Service's pre-check (find_finalized_by_date) under its
        // per-plan_date advisory lock, not by the repository.
        self.plans.write().await.push(plan.clone());
        Ok(())
    }
}
