use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Days granted to every employee for a year they have no ledger row for.
pub const DEFAULT_ANNUAL_QUOTA: i32 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "user_id": 7,
    "year": 2026,
    "total": 12,
    "used": 3,
    "remaining": 9
}))]
pub struct LeaveQuota {
    pub user_id: u64,
    pub year: i32,
    pub total: i32,
    pub used: i32,
    /// Always `total - used`; may go negative when approvals outrun the quota.
    pub remaining: i32,
}

impl LeaveQuota {
    /// The lazily materialized record for an (user, year) pair never written.
    pub fn default_for(user_id: u64, year: i32) -> Self {
        Self {
            user_id,
            year,
            total: DEFAULT_ANNUAL_QUOTA,
            used: 0,
            remaining: DEFAULT_ANNUAL_QUOTA,
        }
    }

    /// Recomputes `remaining` from `total` and `used`.
    pub fn rebalanced(mut self) -> Self {
        self.remaining = self.total - self.used;
        self
    }

    pub fn consumed(self, days: i32) -> Self {
        Self {
            used: self.used + days,
            ..self
        }
        .rebalanced()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining <= 0
    }
}
