//! Application state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use db::{PlanRepository, TrainRepository};
use optimizer_client::OptimizerClient;
use tokio::sync::Mutex;

/// Per-`planDate` advisory lock serializing racing Generate calls
/// in-process, so two concurrent non-forced requests for
/// the same date can't both pass the idempotency pre-check.
pub type GenerateLocks = Arc<Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub train_repo: Arc<dyn TrainRepository>,
    pub plan_repo: Arc<dyn PlanRepository>,
    pub optimizer_client: OptimizerClient,
    pub boot_time: Instant,
    pub generate_locks: GenerateLocks,
}

impl AppState {
    pub fn new(
        train_repo: Arc<dyn TrainRepository>,
        plan_repo: Arc<dyn PlanRepository>,
        optimizer_client: OptimizerClient,
    ) -> Self {
        Self {
            train_repo,
            plan_repo,
            optimizer_client,
            boot_time: Instant::now(),
            generate_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The lock guarding concurrent Generate calls for `plan_date`,
    /// created on first use.
    pub async fn lock_for_date(&self, plan_date: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = self.generate_locks.lock().await;
        locks.entry(plan_date).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}
