use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    AttendanceStore, LeaveQuotaLedger, PendingRequestQueue, StoreError, StoreResult,
    UserDirectory, WorkPermitStore,
};
use crate::model::attendance::{Attendance, NewAttendance};
use crate::model::leave_quota::LeaveQuota;
use crate::model::pending_request::{NewPendingRequest, PendingRequest, RequestKind};
use crate::model::status::RequestStatus;
use crate::model::work_permit::{NewWorkPermit, PermitFilter, WorkPermit};

#[derive(Default)]
struct State {
    next_id: u64,
    quotas: HashMap<(u64, i32), LeaveQuota>,
    permits: BTreeMap<u64, WorkPermit>,
    attendance: BTreeMap<u64, Attendance>,
    requests: BTreeMap<u64, PendingRequest>,
    users: HashMap<u64, String>,
}

impl State {
    fn assign_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store behind a single mutex; every operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A poisoned lock means an earlier operation panicked mid-write, so the
    /// state is no longer trusted and every later call fails.
    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> StoreResult<T> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }

    #[cfg(test)]
    pub fn insert_user(&self, user_id: u64, name: &str) {
        self.with_state(|state| state.users.insert(user_id, name.to_string()))
            .expect("memory store usable");
    }
}

fn remove_where<V>(map: &mut BTreeMap<u64, V>, pred: impl Fn(&V) -> bool) -> u64 {
    let before = map.len();
    map.retain(|_, v| !pred(v));
    (before - map.len()) as u64
}

#[async_trait]
impl LeaveQuotaLedger for MemoryStore {
    async fn get(&self, user_id: u64, year: i32) -> StoreResult<LeaveQuota> {
        self.with_state(|state| {
            state
                .quotas
                .get(&(user_id, year))
                .cloned()
                .unwrap_or_else(|| LeaveQuota::default_for(user_id, year))
        })
    }

    async fn upsert(&self, quota: &LeaveQuota) -> StoreResult<()> {
        self.with_state(|state| {
            state
                .quotas
                .insert((quota.user_id, quota.year), quota.clone());
        })
    }

    async fn consume(&self, user_id: u64, year: i32, days: i32) -> StoreResult<LeaveQuota> {
        self.with_state(|state| {
            let entry = state
                .quotas
                .entry((user_id, year))
                .or_insert_with(|| LeaveQuota::default_for(user_id, year));
            *entry = entry.clone().consumed(days);
            entry.clone()
        })
    }

    async fn reset_all(&self, year: i32) -> StoreResult<u64> {
        self.with_state(|state| {
            let before = state.quotas.len();
            state.quotas.retain(|(_, y), _| *y != year);
            (before - state.quotas.len()) as u64
        })
    }

    async fn delete_for_user(&self, user_id: u64) -> StoreResult<u64> {
        self.with_state(|state| {
            let before = state.quotas.len();
            state.quotas.retain(|(u, _), _| *u != user_id);
            (before - state.quotas.len()) as u64
        })
    }
}

#[async_trait]
impl WorkPermitStore for MemoryStore {
    async fn create(&self, permit: NewWorkPermit) -> StoreResult<WorkPermit> {
        self.with_state(|state| {
            let id = state.assign_id();
            let permit = permit.into_permit(id);
            state.permits.insert(id, permit.clone());
            permit
        })
    }

    async fn get(&self, id: u64) -> StoreResult<WorkPermit> {
        self.with_state(|state| state.permits.get(&id).cloned())?
            .ok_or(StoreError::NotFound {
                entity: "work permit",
                id,
            })
    }

    async fn list_by_user(&self, user_id: u64) -> StoreResult<Vec<WorkPermit>> {
        self.with_state(|state| {
            state
                .permits
                .values()
                .filter(|p| p.user_id == user_id)
                .cloned()
                .collect()
        })
    }

    async fn list(&self, filter: &PermitFilter) -> StoreResult<Vec<WorkPermit>> {
        self.with_state(|state| {
            state
                .permits
                .values()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect()
        })
    }

    async fn set_status(&self, id: u64, status: RequestStatus) -> StoreResult<()> {
        self.with_state(|state| match state.permits.get_mut(&id) {
            Some(permit) => {
                permit.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "work permit",
                id,
            }),
        })?
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        self.with_state(|state| state.permits.remove(&id).is_some())
    }

    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64> {
        self.with_state(|state| remove_where(&mut state.permits, |p| p.user_id == user_id))
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn create(&self, record: NewAttendance) -> StoreResult<Attendance> {
        self.with_state(|state| {
            let id = state.assign_id();
            let record = record.into_record(id);
            state.attendance.insert(id, record.clone());
            record
        })
    }

    async fn list_by_user(&self, user_id: u64) -> StoreResult<Vec<Attendance>> {
        self.with_state(|state| {
            state
                .attendance
                .values()
                .filter(|a| a.user_id == user_id)
                .cloned()
                .collect()
        })
    }

    async fn list_all(&self) -> StoreResult<Vec<Attendance>> {
        self.with_state(|state| state.attendance.values().cloned().collect())
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        self.with_state(|state| state.attendance.remove(&id).is_some())
    }

    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64> {
        self.with_state(|state| remove_where(&mut state.attendance, |a| a.user_id == user_id))
    }
}

#[async_trait]
impl PendingRequestQueue for MemoryStore {
    async fn create(&self, request: NewPendingRequest) -> StoreResult<PendingRequest> {
        self.with_state(|state| {
            let id = state.assign_id();
            let request = request.into_request(id);
            state.requests.insert(id, request.clone());
            request
        })
    }

    async fn get(&self, id: u64) -> StoreResult<PendingRequest> {
        self.with_state(|state| state.requests.get(&id).cloned())?
            .ok_or(StoreError::NotFound {
                entity: "pending request",
                id,
            })
    }

    async fn list_pending(&self) -> StoreResult<Vec<PendingRequest>> {
        self.with_state(|state| {
            state
                .requests
                .values()
                .filter(|r| r.status == RequestStatus::Pending)
                .cloned()
                .collect()
        })
    }

    async fn list_resolved_by_user(&self, user_id: u64) -> StoreResult<Vec<PendingRequest>> {
        self.with_state(|state| {
            state
                .requests
                .values()
                .rev()
                .filter(|r| r.user_id == user_id && r.status.is_terminal())
                .cloned()
                .collect()
        })
    }

    async fn compare_and_set_status(
        &self,
        id: u64,
        expected: RequestStatus,
        next: RequestStatus,
        reject_reason: Option<&str>,
    ) -> StoreResult<bool> {
        self.with_state(|state| match state.requests.get_mut(&id) {
            Some(request) if request.status == expected => {
                request.status = next;
                request.reject_reason = reject_reason.map(str::to_string);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound {
                entity: "pending request",
                id,
            }),
        })?
    }

    async fn delete_pending_by_ref(&self, kind: &RequestKind, ref_id: u64) -> StoreResult<u64> {
        self.with_state(|state| {
            remove_where(&mut state.requests, |r| {
                &r.kind == kind && r.ref_id == Some(ref_id) && r.status == RequestStatus::Pending
            })
        })
    }

    async fn delete_by_user(&self, user_id: u64) -> StoreResult<u64> {
        self.with_state(|state| remove_where(&mut state.requests, |r| r.user_id == user_id))
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn lookup_user_name(&self, user_id: u64) -> StoreResult<Option<String>> {
        self.with_state(|state| state.users.get(&user_id).cloned())
    }
}
