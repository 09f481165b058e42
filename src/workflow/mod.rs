//! Leave-request approval workflow.
//!
//! A work permit and its queue entry move `pending -> approved | rejected`
//! exactly once. Approval is claimed on the queue entry first; the side
//! effects (permit status, synthesized attendance, quota charge) run after
//! the claim and are compensated in reverse order if one of them fails, which
//! leaves the request pending and retryable.

pub mod error;

#[cfg(test)]
mod tests;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::model::attendance::{ActivityDetails, Attendance, AttendanceStatus, NewAttendance};
use crate::model::leave_quota::LeaveQuota;
use crate::model::pending_request::{LeaveTerms, NewPendingRequest, PendingRequest, RequestKind};
use crate::model::status::{RequestStatus, Transition};
use crate::model::work_permit::{NewWorkPermit, PermitFilter, Session, WorkPermit};
use crate::store::Stores;

pub use error::{WorkflowError, WorkflowResult};

const UNKNOWN_USER: &str = "Unknown";

/// Which ledger year an approved full-day leave is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaYear {
    /// Always the given year, regardless of when the leave falls.
    Fixed(i32),
    /// The calendar year of the request's date.
    RequestDate,
}

impl QuotaYear {
    pub fn resolve(self, date: NaiveDate) -> i32 {
        match self {
            QuotaYear::Fixed(year) => year,
            QuotaYear::RequestDate => date.year(),
        }
    }
}

/// What an approve/reject call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// The request was already in the requested state; nothing ran again.
    AlreadyResolved,
}

/// A reviewer-facing request that is not a work permit (e.g. removing an
/// attendance entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSubmission {
    pub kind: RequestKind,
    pub date: NaiveDate,
    pub reason: String,
    pub details: String,
    pub ref_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    pub date: NaiveDate,
    pub activity_type: String,
    pub session: Option<Session>,
    pub activity: ActivityDetails,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct PurgeSummary {
    pub attendance: u64,
    pub work_permits: u64,
    pub pending_requests: u64,
    pub leave_quotas: u64,
}

pub struct ApprovalWorkflow {
    stores: Stores,
    quota_year: QuotaYear,
}

impl ApprovalWorkflow {
    pub fn new(stores: Stores, quota_year: QuotaYear) -> Self {
        Self { stores, quota_year }
    }

    /* =========================
    Applicant side
    ========================= */

    /// Validates and files a leave application, queueing it for review.
    pub async fn submit_work_permit(&self, permit: NewWorkPermit) -> WorkflowResult<WorkPermit> {
        let user_id = permit.user_id;

        if permit.leave_type.requires_quota() {
            let year = Utc::now().year();
            let quota = self.stores.quotas.get(user_id, year).await?;
            if quota.is_exhausted() {
                warn!(user_id, year, leave_type = %permit.leave_type, "Quota exhausted, permit refused");
                return Err(WorkflowError::QuotaExhausted { year });
            }
        }

        if permit.leave_type.is_sick() && !permit.has_supporting_file() {
            return Err(WorkflowError::Validation(
                "a supporting file (doctor's note) is required for sick leave".to_string(),
            ));
        }

        let user_name = self.user_name(user_id).await?;
        let terms = LeaveTerms {
            leave_type: permit.leave_type.clone(),
            session: permit.session,
        };
        let permit = self.stores.permits.create(permit).await?;

        let queued = self
            .stores
            .requests
            .create(NewPendingRequest {
                kind: RequestKind::WorkPermit,
                user_id,
                user_name,
                date: permit.date,
                reason: permit.reason.clone(),
                details: terms.details(),
                created_at: Utc::now(),
                ref_id: Some(permit.id),
                supporting_file: permit.supporting_file.clone(),
                leave: Some(terms),
            })
            .await;

        match queued {
            Ok(request) => {
                info!(user_id, permit_id = permit.id, request_id = request.id, "Work permit submitted");
                Ok(permit)
            }
            Err(e) => {
                error!(error = %e, user_id, permit_id = permit.id, "Queueing work permit failed");
                if let Err(undo) = self.stores.permits.delete(permit.id).await {
                    error!(error = %undo, permit_id = permit.id, "Could not remove unqueued permit");
                }
                Err(e.into())
            }
        }
    }

    /// Lets an applicant take back a permit nobody has ruled on yet.
    pub async fn withdraw_work_permit(&self, user_id: u64, permit_id: u64) -> WorkflowResult<()> {
        let permit = self.stores.permits.get(permit_id).await?;

        if permit.user_id != user_id {
            warn!(user_id, permit_id, owner = permit.user_id, "Withdrawal by non-owner refused");
            return Err(WorkflowError::Forbidden(
                "you can only withdraw your own work permits".to_string(),
            ));
        }

        if permit.status != RequestStatus::Pending {
            return Err(WorkflowError::InvalidState(format!(
                "only pending work permits can be withdrawn (this one is {})",
                permit.status
            )));
        }

        // A claimed or resolved queue entry belongs to the reviewer.
        let removed = self
            .stores
            .requests
            .delete_pending_by_ref(&RequestKind::WorkPermit, permit_id)
            .await?;
        if removed == 0 {
            warn!(user_id, permit_id, "Withdrawal lost to a review in progress");
            return Err(WorkflowError::InvalidState(
                "this work permit is already being reviewed".to_string(),
            ));
        }

        self.stores.permits.delete(permit_id).await?;

        info!(user_id, permit_id, "Work permit withdrawn");
        Ok(())
    }

    pub async fn submit_request(
        &self,
        user_id: u64,
        submission: RequestSubmission,
    ) -> WorkflowResult<PendingRequest> {
        if submission.kind == RequestKind::WorkPermit {
            return Err(WorkflowError::Validation(
                "work permits must be submitted as work permits".to_string(),
            ));
        }
        if submission.reason.trim().is_empty() {
            return Err(WorkflowError::Validation("a reason is required".to_string()));
        }

        let user_name = self.user_name(user_id).await?;
        let request = self
            .stores
            .requests
            .create(NewPendingRequest {
                kind: submission.kind,
                user_id,
                user_name,
                date: submission.date,
                reason: submission.reason,
                details: submission.details,
                created_at: Utc::now(),
                ref_id: submission.ref_id,
                supporting_file: None,
                leave: None,
            })
            .await?;

        info!(user_id, request_id = request.id, kind = %request.kind, "Request queued");
        Ok(request)
    }

    pub async fn record_attendance(
        &self,
        user_id: u64,
        entry: AttendanceEntry,
    ) -> WorkflowResult<Attendance> {
        let record = self
            .stores
            .attendance
            .create(NewAttendance {
                user_id,
                date: entry.date,
                activity_type: entry.activity_type,
                session: entry.session,
                status: AttendanceStatus::Present,
                created_at: Utc::now(),
                activity: entry.activity,
            })
            .await?;
        Ok(record)
    }

    pub async fn get_quota(&self, user_id: u64, year: i32) -> WorkflowResult<LeaveQuota> {
        Ok(self.stores.quotas.get(user_id, year).await?)
    }

    pub async fn list_user_permits(&self, user_id: u64) -> WorkflowResult<Vec<WorkPermit>> {
        Ok(self.stores.permits.list_by_user(user_id).await?)
    }

    /// Approved and rejected requests the applicant should hear about.
    pub async fn list_notifications(&self, user_id: u64) -> WorkflowResult<Vec<PendingRequest>> {
        Ok(self.stores.requests.list_resolved_by_user(user_id).await?)
    }

    pub async fn list_attendance(&self, user_id: u64) -> WorkflowResult<Vec<Attendance>> {
        Ok(self.stores.attendance.list_by_user(user_id).await?)
    }

    /* =========================
    Reviewer side
    ========================= */

    pub async fn list_pending_requests(&self) -> WorkflowResult<Vec<PendingRequest>> {
        Ok(self.stores.requests.list_pending().await?)
    }

    pub async fn list_permits(&self, filter: &PermitFilter) -> WorkflowResult<Vec<WorkPermit>> {
        Ok(self.stores.permits.list(filter).await?)
    }

    pub async fn list_all_attendance(&self) -> WorkflowResult<Vec<Attendance>> {
        Ok(self.stores.attendance.list_all().await?)
    }

    pub async fn approve_request(&self, request_id: u64) -> WorkflowResult<Resolution> {
        let request = self.stores.requests.get(request_id).await?;
        if self
            .claim(&request, RequestStatus::Approved, None)
            .await?
            == Resolution::AlreadyResolved
        {
            info!(request_id, "Request already approved, nothing to do");
            return Ok(Resolution::AlreadyResolved);
        }

        let applied = match &request.kind {
            RequestKind::DeleteAttendance => self.apply_attendance_removal(&request).await,
            RequestKind::WorkPermit => self.apply_permit_approval(&request).await,
            RequestKind::Other(_) => Ok(()),
        };

        if let Err(e) = applied {
            error!(error = %e, request_id, kind = %request.kind, "Approval failed, releasing request");
            self.release(request_id, RequestStatus::Approved).await;
            return Err(e);
        }

        info!(request_id, user_id = request.user_id, kind = %request.kind, "Request approved");
        Ok(Resolution::Applied)
    }

    pub async fn reject_request(&self, request_id: u64, reason: &str) -> WorkflowResult<Resolution> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::Validation(
                "a reason is required to reject a request".to_string(),
            ));
        }

        let request = self.stores.requests.get(request_id).await?;
        if self
            .claim(&request, RequestStatus::Rejected, Some(reason))
            .await?
            == Resolution::AlreadyResolved
        {
            return Ok(Resolution::AlreadyResolved);
        }

        if let (RequestKind::WorkPermit, Some(permit_id)) = (&request.kind, request.ref_id) {
            if let Err(e) = self
                .stores
                .permits
                .set_status(permit_id, RequestStatus::Rejected)
                .await
            {
                error!(error = %e, request_id, permit_id, "Rejecting permit failed, releasing request");
                self.release(request_id, RequestStatus::Rejected).await;
                return Err(e.into());
            }
        }

        info!(request_id, user_id = request.user_id, reason, "Request rejected");
        Ok(Resolution::Applied)
    }

    /* =========================
    Administration
    ========================= */

    /// Overrides the entitlement for one (user, year), keeping consumption.
    pub async fn adjust_quota(&self, user_id: u64, year: i32, total: i32) -> WorkflowResult<LeaveQuota> {
        if total < 0 {
            return Err(WorkflowError::Validation(
                "total quota cannot be negative".to_string(),
            ));
        }

        let quota = LeaveQuota {
            total,
            ..self.stores.quotas.get(user_id, year).await?
        }
        .rebalanced();
        self.stores.quotas.upsert(&quota).await?;

        info!(user_id, year, total, remaining = quota.remaining, "Leave quota adjusted");
        Ok(quota)
    }

    /// Annual rollover: everyone falls back to the default entitlement.
    pub async fn reset_quotas(&self, year: i32) -> WorkflowResult<u64> {
        let removed = self.stores.quotas.reset_all(year).await?;
        info!(year, removed, "Leave quotas reset");
        Ok(removed)
    }

    /// Removes every leave-related record of a deleted user.
    pub async fn purge_user(&self, user_id: u64) -> WorkflowResult<PurgeSummary> {
        let summary = PurgeSummary {
            attendance: self.stores.attendance.delete_by_user(user_id).await?,
            work_permits: self.stores.permits.delete_by_user(user_id).await?,
            pending_requests: self.stores.requests.delete_by_user(user_id).await?,
            leave_quotas: self.stores.quotas.delete_for_user(user_id).await?,
        };
        info!(user_id, ?summary, "User records purged");
        Ok(summary)
    }

    /* =========================
    Internals
    ========================= */

    async fn user_name(&self, user_id: u64) -> WorkflowResult<String> {
        Ok(self
            .stores
            .users
            .lookup_user_name(user_id)
            .await?
            .unwrap_or_else(|| UNKNOWN_USER.to_string()))
    }

    /// Moves the request out of `pending` before any side effect runs, so
    /// that concurrent or repeated calls cannot apply them twice.
    async fn claim(
        &self,
        request: &PendingRequest,
        to: RequestStatus,
        reject_reason: Option<&str>,
    ) -> WorkflowResult<Resolution> {
        if request.status.transition(to)? == Transition::NoOp {
            return Ok(Resolution::AlreadyResolved);
        }

        let claimed = self
            .stores
            .requests
            .compare_and_set_status(request.id, RequestStatus::Pending, to, reject_reason)
            .await?;
        if claimed {
            return Ok(Resolution::Applied);
        }

        let current = self.stores.requests.get(request.id).await?;
        match current.status.transition(to)? {
            Transition::NoOp => Ok(Resolution::AlreadyResolved),
            Transition::Apply(_) => Err(WorkflowError::InvalidState(
                "request changed while being resolved, retry".to_string(),
            )),
        }
    }

    async fn release(&self, request_id: u64, from: RequestStatus) {
        match self
            .stores
            .requests
            .compare_and_set_status(request_id, from, RequestStatus::Pending, None)
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(request_id, "Request moved on before it could be released"),
            Err(e) => error!(error = %e, request_id, "Could not release request"),
        }
    }

    async fn apply_attendance_removal(&self, request: &PendingRequest) -> WorkflowResult<()> {
        let Some(attendance_id) = request.ref_id else {
            return Ok(());
        };

        if !self.stores.attendance.delete(attendance_id).await? {
            warn!(request_id = request.id, attendance_id, "Attendance already gone");
        }
        Ok(())
    }

    async fn apply_permit_approval(&self, request: &PendingRequest) -> WorkflowResult<()> {
        let Some(permit_id) = request.ref_id else {
            return Ok(());
        };

        let permit = self.stores.permits.get(permit_id).await?;
        self.stores
            .permits
            .set_status(permit_id, RequestStatus::Approved)
            .await?;

        let attendance = self
            .stores
            .attendance
            .create(NewAttendance {
                user_id: request.user_id,
                date: request.date,
                activity_type: permit.leave_type.to_string(),
                session: Some(permit.session),
                status: AttendanceStatus::for_leave(&permit.leave_type),
                created_at: Utc::now(),
                activity: ActivityDetails::default(),
            })
            .await;
        let attendance = match attendance {
            Ok(record) => record,
            Err(e) => {
                self.undo_permit_approval(permit_id).await;
                return Err(e.into());
            }
        };

        let terms = request.leave.clone().unwrap_or(LeaveTerms {
            leave_type: permit.leave_type.clone(),
            session: permit.session,
        });
        if !terms.consumes_quota() {
            return Ok(());
        }

        let year = self.quota_year.resolve(request.date);
        match self.stores.quotas.consume(request.user_id, year, 1).await {
            Ok(quota) => {
                info!(
                    user_id = request.user_id,
                    year,
                    used = quota.used,
                    remaining = quota.remaining,
                    "Leave quota charged"
                );
                Ok(())
            }
            Err(e) => {
                if let Err(undo) = self.stores.attendance.delete(attendance.id).await {
                    error!(error = %undo, attendance_id = attendance.id, "Could not remove leave attendance");
                }
                self.undo_permit_approval(permit_id).await;
                Err(e.into())
            }
        }
    }

    async fn undo_permit_approval(&self, permit_id: u64) {
        if let Err(e) = self
            .stores
            .permits
            .set_status(permit_id, RequestStatus::Pending)
            .await
        {
            error!(error = %e, permit_id, "Could not reset permit to pending");
        }
    }
}
