//! Pagination envelope for list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Query parameters accepted by `GET /history`.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_limit() -> u32 {
    10
}

fn default_page() -> u32 {
    1
}

impl PageQuery {
    /// Clamp to the wire contract's bounds: `limit` in `1..=100`, `page >= 1`.
    pub fn normalized(self) -> Self {
        Self {
            limit: self.limit.clamp(1, 100),
            page: self.page.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        ((self.page.max(1) - 1) as i64) * self.limit as i64
    }
}

/// Pagination metadata echoed back on list responses.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_limit_and_page() {
        let q = PageQuery {
            limit: 500,
            page: 0,
        }
        .normalized();
        assert_eq!(q.limit, 100);
        assert_eq!(q.page, 1);
    }

    #[test]
    fn offset_computation() {
        let q = PageQuery { limit: 10, page: 3 }.normalized();
        assert_eq!(q.offset(), 20);
    }
}
