//! `TrainRepository`: read access to the fleet roster that
//! the planning engine plans over. Trainset provisioning is out of scope
//! (spec Non-goals) — only reads are exposed here.

use async_trait::async_trait;
use domain::Train;
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
pub trait TrainRepository: Send + Sync {
    /// All trains in the fleet, in no particular order.
    async fn list(&self) -> Result<Vec<Train>, DbError>;

    /// A single train by opaque id.
    async fn get(&self, id: Uuid) -> Result<Option<Train>, DbError>;

    /// A single train by human-readable trainset code.
    async fn get_by_code(&self, code: &str) -> Result<Option<Train>, DbError>;

    /// Resolve a `TrainRef`'s current code, if the train still exists.
    async fn resolve_code(&self, id: Uuid) -> Result<Option<String>, DbError> {
        Ok(self.get(id).await?.map(|t| t.code))
    }
}
