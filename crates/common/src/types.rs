//! Shared wire types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A reference to a trainset that may no longer exist. Resolution against the live `TrainRepository` happens at
/// read time; an unresolvable reference keeps the last-known code.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainRef {
    pub id: uuid::Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl TrainRef {
    pub fn new(id: uuid::Uuid, code: impl Into<String>) -> Self {
        Self {
            id,
            code: Some(code.into()),
        }
    }
}
