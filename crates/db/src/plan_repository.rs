//! `PlanRepository`: durable storage for
//! `InductionPlan` records. Simulation plans are never passed here — the
//! Plan Service only persists `DRAFT`/`FINALIZED` results.

use async_trait::async_trait;
use chrono::NaiveDate;
use common::Pagination;
use domain::InductionPlan;
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// The most recently generated plan, regardless of status.
    async fn get_latest(&self) -> Result<Option<InductionPlan>, DbError>;

    /// Page through plan history, most recent first.
    async fn get_history(&self, limit: i64, offset: i64) -> Result<(Vec<InductionPlan>, i64), DbError>;

    /// A single plan by id, for the explain endpoint.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<InductionPlan>, DbError>;

    /// The finalized plan for a given date, if one already exists.
    async fn find_finalized_by_date(&self, plan_date: NaiveDate) -> Result<Option<InductionPlan>, DbError>;

    /// Persist a newly generated plan. Does not itself enforce the
    /// one-FINALIZED-plan-per-date rule: `forceRegenerate` legitimately
    /// inserts a second FINALIZED row for an already-planned date. The
    /// Plan Service enforces idempotency for non-forced calls via
    /// `find_finalized_by_date` under a per-`plan_date` advisory lock.
    async fn insert(&self, plan: &InductionPlan) -> Result<(), DbError>;
}

pub fn paginate(total: i64, limit: i64, offset: i64) -> Pagination {
    let page = if limit > 0 { offset / limit + 1 } else { 1 };
    Pagination {
        page: page.max(1) as u32,
        limit: limit.max(1) as u32,
        total: total.max(0),
    }
}
