//! Persistence collaborators of the leave workflow.
//!
//! Each collection is a small async trait so the workflow can run against
//! MySQL in production and against [`memory::MemoryStore`] in tests or
//! local runs. Stores enforce no business rules beyond "new records start
//! out pending".

pub mod memory;
pub mod mysql;

use std::sync::Arc;

use async_trait::async_trait;
use derive_more::Display;

use crate::model::attendance::{Attendance, NewAttendance};
use crate::model::leave_quota::LeaveQuota;
use crate::model::pending_request::{NewPendingRequest, PendingRequest, RequestKind};
use crate::model::status::RequestStatus;
use crate::model::work_permit::{NewWorkPermit, PermitFilter, WorkPermit};

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "{} {} not found", entity, id)]
    NotFound { entity: &'static str, id: u64 },
    #[display(fmt = "stored value could not be decoded: {}", _0)]
    Corrupt(String),
    #[display(fmt = "storage backend failure: {}", _0)]
    Backend(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(err.to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Annual entitlement and consumption per (user, year).
#[async_trait]
pub trait LeaveQuotaLedger: Send + Sync {
    /// Stored record, or the unsaved default when the pair was never written.
    async fn get(&self, user_id: u64, year: i32) -> StoreResult<LeaveQuota>;

    /// Replaces the (user, year) record as given. `remaining` is taken as is.
    async fn upsert(&self, quota: &LeaveQuota) -> StoreResult<()>;

    /// Adds `days` to `used` and recomputes `remaining` in one atomic step,
    /// materializing the default record first if needed.
    async fn consume(&self, user_id: u64, year: i32, days: i32) -> StoreResult<LeaveQuota>;

    /// Drops every record of `year`; returns how many were removed.
    async fn reset_all(&self, year: i32) -> StoreResult<u64>;

    async fn delete_for_user(&self, user_id: u64) -> StoreResult<u64>;
}

#[async_trait]
pub trait WorkPermitStore: Send + Sync {
    async fn create(&self, permit: NewWorkPermit) -> StoreResult<WorkPermit>;
    async fn get(&self, id: u64) -> StoreResult<WorkPermit>;
    async fn list_by_user(&self, user_id: u64) -> StoreResult<Vec<WorkPermit>>;
    async fn list(&self, filter: &PermitFilter) -> StoreResult<Vec<WorkPermit>>;
    /// Unconditional; transition rules live in the workflow.
    async fn set_status(&self, id: u64, status: RequestStatus) -> StoreResult<()>;
    async fn delete(&self, id: u64) -> StoreResult<bool>;
    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn create(&self, record: NewAttendance) -> StoreResult<Attendance>;
    async fn list_by_user(&self, user_id: u64) -> StoreResult<Vec<Attendance>>;
    async fn list_all(&self) -> StoreResult<Vec<Attendance>>;
    async fn delete(&self, id: u64) -> StoreResult<bool>;
    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64>;
}

/// The reviewer's approval inbox.
#[async_trait]
pub trait PendingRequestQueue: Send + Sync {
    async fn create(&self, request: NewPendingRequest) -> StoreResult<PendingRequest>;
    async fn get(&self, id: u64) -> StoreResult<PendingRequest>;
    async fn list_pending(&self) -> StoreResult<Vec<PendingRequest>>;
    /// Approved or rejected requests of one applicant, newest first.
    async fn list_resolved_by_user(&self, user_id: u64) -> StoreResult<Vec<PendingRequest>>;
    /// Writes `next` only while the stored status still equals `expected`.
    /// Returns whether the write happened.
    async fn compare_and_set_status(
        &self,
        id: u64,
        expected: RequestStatus,
        next: RequestStatus,
        reject_reason: Option<&str>,
    ) -> StoreResult<bool>;
    /// Removes the entry of `kind` pointing at `ref_id` only while it is
    /// still pending; a claimed or resolved entry is left alone.
    async fn delete_pending_by_ref(&self, kind: &RequestKind, ref_id: u64) -> StoreResult<u64>;
    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup_user_name(&self, user_id: u64) -> StoreResult<Option<String>>;
}

/// Handles to every collection the workflow touches.
#[derive(Clone)]
pub struct Stores {
    pub quotas: Arc<dyn LeaveQuotaLedger>,
    pub permits: Arc<dyn WorkPermitStore>,
    pub attendance: Arc<dyn AttendanceStore>,
    pub requests: Arc<dyn PendingRequestQueue>,
    pub users: Arc<dyn UserDirectory>,
}

impl Stores {
    pub fn mysql(pool: sqlx::MySqlPool) -> Self {
        let store = Arc::new(mysql::MySqlStore::new(pool));
        Self {
            quotas: store.clone(),
            permits: store.clone(),
            attendance: store.clone(),
            requests: store.clone(),
            users: store,
        }
    }

    pub fn memory(store: Arc<memory::MemoryStore>) -> Self {
        Self {
            quotas: store.clone(),
            permits: store.clone(),
            attendance: store.clone(),
            requests: store.clone(),
            users: store,
        }
    }
}
